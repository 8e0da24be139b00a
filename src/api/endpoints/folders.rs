//! Destination registry CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{
    delete_destination, get_destination, insert_destination, list_destinations,
    update_destination,
};
use crate::models::{Destination, DestinationId, DestinationInput};

/// `POST /save-folder/`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(input): Json<DestinationInput>,
) -> Result<Json<Destination>, ApiError> {
    let created = ctx.with_db(|conn| insert_destination(conn, &input))?;
    tracing::info!(
        folder_id = %created.id,
        requirements = created.requirements.len(),
        "Destination registered"
    );
    Ok(Json(created))
}

/// `GET /get-folders/`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Destination>>, ApiError> {
    Ok(Json(ctx.with_db(|conn| list_destinations(conn))?))
}

/// `GET /get/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Destination>, ApiError> {
    ctx.with_db(|conn| get_destination(conn, DestinationId(id)))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Folder {id} not found")))
}

/// `PUT /edit/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(input): Json<DestinationInput>,
) -> Result<Json<Destination>, ApiError> {
    let updated = ctx.with_db(|conn| update_destination(conn, DestinationId(id), &input))?;
    tracing::info!(folder_id = id, "Destination updated");
    Ok(Json(updated))
}

/// `DELETE /delete/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    ctx.with_db(|conn| delete_destination(conn, DestinationId(id)))?;
    tracing::info!(folder_id = id, "Destination deleted");
    Ok(StatusCode::NO_CONTENT)
}

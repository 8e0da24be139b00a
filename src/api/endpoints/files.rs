//! File classification endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ManageFileRequest};
use crate::models::{FileTask, RouteOutcome};

/// `POST /manage-file/`: classify one file and move it.
///
/// The pipeline blocks on the oracle, so it runs on the blocking pool.
pub async fn manage(
    State(ctx): State<ApiContext>,
    Json(req): Json<ManageFileRequest>,
) -> Result<(StatusCode, Json<RouteOutcome>), ApiError> {
    let task_id = Uuid::parse_str(req.uuid.trim())
        .map_err(|e| ApiError::BadRequest(format!("uuid: {e}")))?;
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is empty".into()));
    }

    let task = FileTask {
        task_id,
        file_name: req.name,
        source_path: req.path,
    };

    let pipeline = ctx.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || pipeline.classify_and_route(&task)).await?;

    Ok((status_for(&outcome), Json(outcome)))
}

fn status_for(outcome: &RouteOutcome) -> StatusCode {
    match outcome.failure_reason() {
        None => StatusCode::OK,
        Some(kind) if kind.is_classification_fault() => StatusCode::UNPROCESSABLE_ENTITY,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

//! Server lifecycle: open the registry, assemble the pipeline, bind and
//! serve until Ctrl-C.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::api::router::api_router;
use crate::api::types::ApiContext;
use crate::config::AppConfig;
use crate::db::{open_database, DatabaseError, SqliteRegistry};
use crate::pipeline::classification::ClassificationError;
use crate::pipeline::ClassificationPipeline;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Cannot open registry database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Cannot build classification oracle: {0}")]
    Oracle(#[from] ClassificationError),

    #[error("Cannot create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Async runtime failed: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Open the registry and assemble the pipeline described by `config`.
///
/// Builds the blocking oracle client, so call it outside any async runtime.
pub fn build_context(config: &AppConfig) -> Result<ApiContext, ServerError> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ServerError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let conn = open_database(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), "Registry database opened");

    let registry = SqliteRegistry::new(Arc::new(Mutex::new(conn)));
    let pipeline = ClassificationPipeline::from_config(config, Arc::new(registry.clone()))?;
    tracing::info!(
        fallback = %pipeline.fallback_dir().display(),
        model = pipeline.oracle_model(),
        "Classification pipeline ready"
    );

    Ok(ApiContext::new(pipeline, registry))
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(ctx: ApiContext, addr: SocketAddr, allowed_origin: &str) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let local = listener.local_addr().map_err(ServerError::Runtime)?;
    tracing::info!(addr = %local, origin = allowed_origin, "Munch API listening");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };

    axum::serve(listener, api_router(ctx, allowed_origin))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(ServerError::Runtime)
}

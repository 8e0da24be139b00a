//! Shared state and wire types for the HTTP layer.

use std::path::PathBuf;
use std::sync::{Arc, MutexGuard};

use rusqlite::Connection;
use serde::Deserialize;

use crate::db::{DatabaseError, SqliteRegistry};
use crate::pipeline::ClassificationPipeline;

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes. Cheap to clone.
#[derive(Clone)]
pub struct ApiContext {
    pub pipeline: Arc<ClassificationPipeline>,
    pub registry: SqliteRegistry,
}

impl ApiContext {
    pub fn new(pipeline: ClassificationPipeline, registry: SqliteRegistry) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            registry,
        }
    }

    /// Run `f` with the registry connection locked.
    pub fn with_db<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self.registry.connection();
        let mut guard: MutexGuard<'_, Connection> =
            conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&mut guard)
    }
}

// ═══════════════════════════════════════════════════════════
// Request bodies
// ═══════════════════════════════════════════════════════════

/// `POST /manage-file/` body: the caller's id for the file, its declared
/// name, and where it currently sits on disk.
#[derive(Debug, Deserialize)]
pub struct ManageFileRequest {
    pub uuid: String,
    pub name: String,
    pub path: PathBuf,
}

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use super::repository::list_destinations;
use super::DatabaseError;
use crate::pipeline::classification::{ClassificationError, DestinationRegistry, RequirementSnapshot};

/// Destination registry backed by the shared SQLite connection.
///
/// Writes go through the repository functions while holding the same
/// mutex, so a snapshot never observes a half-applied edit.
#[derive(Clone)]
pub struct SqliteRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRegistry {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

impl DestinationRegistry for SqliteRegistry {
    fn snapshot(&self) -> Result<RequirementSnapshot, ClassificationError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let destinations = list_destinations(&conn)?;
        Ok(RequirementSnapshot::new(destinations))
    }
}

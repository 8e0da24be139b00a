use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{Destination, DestinationId, DestinationInput, Requirement};

// ═══════════════════════════════════════════
// Destination Repository
// ═══════════════════════════════════════════

const SELECT_WITH_REQUIREMENTS: &str =
    "SELECT f.id, f.folder_name, f.folder_path, f.created_at, r.id, r.description
     FROM folders f
     LEFT JOIN requirements r ON r.folder_id = f.id";

/// Register a new destination together with its requirements.
///
/// Folder paths are unique across the registry.
pub fn insert_destination(
    conn: &mut Connection,
    input: &DestinationInput,
) -> Result<Destination, DatabaseError> {
    validate_input(input)?;

    let tx = conn.transaction()?;
    let path = path_text(&input.folder_path);
    if folder_id_for_path(&tx, &path)?.is_some() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Folder with path {path} already exists"
        )));
    }

    let created_at = chrono::Utc::now().naive_utc();
    tx.execute(
        "INSERT INTO folders (folder_name, folder_path, created_at) VALUES (?1, ?2, ?3)",
        params![input.folder_name.trim(), path, created_at],
    )?;
    let id = tx.last_insert_rowid();
    insert_requirements(&tx, id, input)?;
    tx.commit()?;

    tracing::debug!(folder_id = id, requirements = input.requirements.len(), "Destination created");

    get_destination(conn, DestinationId(id))?.ok_or_else(|| not_found(DestinationId(id)))
}

/// All destinations ordered by id, each with requirements in registry order.
///
/// One statement, so the result is a consistent point-in-time read.
pub fn list_destinations(conn: &Connection) -> Result<Vec<Destination>, DatabaseError> {
    let sql = format!("{SELECT_WITH_REQUIREMENTS} ORDER BY f.id, r.position, r.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], DestinationRow::from_row)?;
    collect_destinations(rows)
}

pub fn get_destination(
    conn: &Connection,
    id: DestinationId,
) -> Result<Option<Destination>, DatabaseError> {
    let sql = format!("{SELECT_WITH_REQUIREMENTS} WHERE f.id = ?1 ORDER BY r.position, r.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![id.0], DestinationRow::from_row)?;
    Ok(collect_destinations(rows)?.into_iter().next())
}

/// Replace name, path and the full requirement list of a destination.
pub fn update_destination(
    conn: &mut Connection,
    id: DestinationId,
    input: &DestinationInput,
) -> Result<Destination, DatabaseError> {
    validate_input(input)?;

    let tx = conn.transaction()?;
    let path = path_text(&input.folder_path);
    if let Some(owner) = folder_id_for_path(&tx, &path)? {
        if owner != id.0 {
            return Err(DatabaseError::ConstraintViolation(format!(
                "Folder with path {path} already exists"
            )));
        }
    }

    let updated = tx.execute(
        "UPDATE folders SET folder_name = ?1, folder_path = ?2 WHERE id = ?3",
        params![input.folder_name.trim(), path, id.0],
    )?;
    if updated == 0 {
        return Err(not_found(id));
    }

    tx.execute("DELETE FROM requirements WHERE folder_id = ?1", params![id.0])?;
    insert_requirements(&tx, id.0, input)?;
    tx.commit()?;

    get_destination(conn, id)?.ok_or_else(|| not_found(id))
}

/// Delete a destination; its requirements cascade.
pub fn delete_destination(conn: &Connection, id: DestinationId) -> Result<(), DatabaseError> {
    let deleted = conn.execute("DELETE FROM folders WHERE id = ?1", params![id.0])?;
    if deleted == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

// ───────────────────────────────────────────
// Row mapping
// ───────────────────────────────────────────

struct DestinationRow {
    id: i64,
    folder_name: String,
    folder_path: String,
    created_at: NaiveDateTime,
    requirement_id: Option<i64>,
    description: Option<String>,
}

impl DestinationRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            folder_name: row.get(1)?,
            folder_path: row.get(2)?,
            created_at: row.get(3)?,
            requirement_id: row.get(4)?,
            description: row.get(5)?,
        })
    }
}

fn collect_destinations<I>(rows: I) -> Result<Vec<Destination>, DatabaseError>
where
    I: Iterator<Item = rusqlite::Result<DestinationRow>>,
{
    let mut by_id: BTreeMap<i64, Destination> = BTreeMap::new();
    for row in rows {
        let row = row?;
        let dest = by_id.entry(row.id).or_insert_with(|| Destination {
            id: DestinationId(row.id),
            folder_name: row.folder_name.clone(),
            folder_path: PathBuf::from(&row.folder_path),
            requirements: Vec::new(),
            created_at: row.created_at,
        });
        if let (Some(req_id), Some(description)) = (row.requirement_id, row.description) {
            dest.requirements.push(Requirement {
                id: req_id,
                description,
            });
        }
    }
    Ok(by_id.into_values().collect())
}

fn insert_requirements(
    conn: &Connection,
    folder_id: i64,
    input: &DestinationInput,
) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO requirements (folder_id, description, position) VALUES (?1, ?2, ?3)",
    )?;
    for (position, req) in input.requirements.iter().enumerate() {
        stmt.execute(params![folder_id, req.description.trim(), position as i64])?;
    }
    Ok(())
}

fn folder_id_for_path(conn: &Connection, path: &str) -> Result<Option<i64>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id FROM folders WHERE folder_path = ?1",
            params![path],
            |row| row.get(0),
        )
        .optional()?)
}

fn validate_input(input: &DestinationInput) -> Result<(), DatabaseError> {
    if input.folder_name.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation("folder_name is empty".into()));
    }
    if !input.folder_path.is_absolute() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "folder_path must be absolute: {}",
            input.folder_path.display()
        )));
    }
    if input.requirements.iter().any(|r| r.description.trim().is_empty()) {
        return Err(DatabaseError::ConstraintViolation(
            "requirement description is empty".into(),
        ));
    }
    Ok(())
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn not_found(id: DestinationId) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "Folder".into(),
        id: id.to_string(),
    }
}

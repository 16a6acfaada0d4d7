//! Table provisioning for the gallery experience store.
//!
//! # Invariants
//! - Provisioning is idempotent and never alters an existing table.
//! - Column order matches `repo::gallery_experience_repo::COLUMNS`.

use super::DbResult;
use rusqlite::Connection;

const GALLERY_EXPERIENCES_SQL: &str = include_str!("sql/gallery_experiences.sql");

/// Name of the backing table.
pub const GALLERY_EXPERIENCES_TABLE: &str = "gallery_experiences";

/// Creates the `gallery_experiences` table when it does not exist yet.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(GALLERY_EXPERIENCES_SQL)?;
    Ok(())
}

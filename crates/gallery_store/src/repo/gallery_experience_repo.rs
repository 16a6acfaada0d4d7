//! Gallery experience repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide get/list/count/insert/update/soft-delete over
//!   `gallery_experiences`.
//! - Map rows to `GalleryExperience` through one shared column list.
//!
//! # Invariants
//! - `COLUMNS` is the only description of the row shape: SELECT, INSERT,
//!   decoding and readiness checks are all derived from it.
//! - Listing and counting only see rows with `is_deleted = 0 AND is_active = 1`.
//! - Update must affect exactly one row; delete does not check affected rows.
//! - Row cursors and statements are released on every exit path (RAII).

use crate::config::StoreConfig;
use crate::context::{InterruptGuard, OperationContext, DEFAULT_PROGRESS_INTERVAL_OPS};
use crate::db::schema::GALLERY_EXPERIENCES_TABLE;
use crate::db::DbError;
use crate::events::{LogEventSink, RepoEvent, RepoEventSink, RepoOperation};
use crate::model::gallery_experience::{require_actor, GalleryExperience, ValidationError};
use crate::timestamp::{format_timestamp, now_millis, parse_timestamp};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rusqlite::{named_params, params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

const ID: &str = "id";
const CREATED_BY: &str = "created_by";
const CREATED_DATE: &str = "created_date";
const MODIFIED_BY: &str = "modified_by";
const MODIFIED_DATE: &str = "modified_date";
const DELETED_BY: &str = "deleted_by";
const DELETED_DATE: &str = "deleted_date";
const IS_DELETED: &str = "is_deleted";
const IS_ACTIVE: &str = "is_active";
const EXPERIENCE_NAME: &str = "experience_name";
const EXPERIENCE_DESC: &str = "experience_desc";
const EXPERIENCE_PICTURE: &str = "experience_picture";
const LONGITUDE: &str = "longitude";
const LATITUDE: &str = "latitude";

/// Column layout of `gallery_experiences`, in table order.
pub const COLUMNS: [&str; 14] = [
    ID,
    CREATED_BY,
    CREATED_DATE,
    MODIFIED_BY,
    MODIFIED_DATE,
    DELETED_BY,
    DELETED_DATE,
    IS_DELETED,
    IS_ACTIVE,
    EXPERIENCE_NAME,
    EXPERIENCE_DESC,
    EXPERIENCE_PICTURE,
    LONGITUDE,
    LATITUDE,
];

static SELECT_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "SELECT {} FROM {GALLERY_EXPERIENCES_TABLE}",
        COLUMNS.join(", ")
    )
});

static INSERT_SQL: Lazy<String> = Lazy::new(|| {
    let placeholders = COLUMNS
        .iter()
        .map(|column| format!(":{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {GALLERY_EXPERIENCES_TABLE} ({}) VALUES ({placeholders});",
        COLUMNS.join(", ")
    )
});

const VISIBLE_FILTER: &str = "is_deleted = 0 AND is_active = 1";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error taxonomy for gallery experience persistence.
#[derive(Debug)]
pub enum RepoError {
    /// `get_by_id` matched no row.
    NotFound(String),
    /// Statement preparation or execution failed, including constraint
    /// violations such as a duplicate `id`.
    Query(DbError),
    /// A returned row did not decode into the record shape.
    Scan(rusqlite::Error),
    /// A row decoded but held a value outside the record's domain.
    InvalidData(String),
    /// `update` changed a row count other than one.
    AffectedRowMismatch { id: String, affected: usize },
    /// A lookup or delete was called with an empty identifier.
    EmptyId,
    Validation(ValidationError),
    /// The operation context was cancelled or its deadline passed.
    Cancelled,
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "gallery experience not found: {id}"),
            Self::Query(err) => write!(f, "query failed: {err}"),
            Self::Scan(err) => write!(f, "failed to decode gallery experience row: {err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted gallery experience data: {message}")
            }
            Self::AffectedRowMismatch { id, affected } => write!(
                f,
                "expected exactly one row affected for id `{id}`, got {affected}"
            ),
            Self::EmptyId => write!(f, "gallery experience id cannot be empty"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::Scan(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Query(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
            return Self::Cancelled;
        }
        Self::Query(DbError::Sqlite(value))
    }
}

/// Repository interface for gallery experience persistence.
pub trait GalleryExperienceRepository {
    /// Loads one record by id, whatever its delete/active state.
    ///
    /// # Errors
    /// - `EmptyId` for an empty or blank id.
    /// - `NotFound` when no row has this id.
    fn get_by_id(&self, ctx: &OperationContext, id: &str) -> RepoResult<GalleryExperience>;
    /// Lists visible records, ordered by `created_date` then `id`.
    ///
    /// `created_date` is compared as TEXT. That order is chronological for
    /// values this store writes (fixed-width UTC, `...sssZ`); rows written by
    /// other tools with non-UTC offsets or other precisions still decode but
    /// may sort out of chronological order.
    fn list(&self, ctx: &OperationContext, limit: u32, offset: u32)
        -> RepoResult<Vec<GalleryExperience>>;
    /// Counts visible records.
    fn count(&self, ctx: &OperationContext) -> RepoResult<u64>;
    /// Inserts a new record; the store assigns `created_date`.
    fn insert(&self, ctx: &OperationContext, experience: &GalleryExperience) -> RepoResult<()>;
    /// Replaces content fields and stamps `modified_by`/`modified_date`.
    ///
    /// # Errors
    /// - `Validation(MissingActor)` when `modified_by` is absent or blank.
    /// - `AffectedRowMismatch` unless exactly one row changed.
    fn update(&self, ctx: &OperationContext, experience: &GalleryExperience) -> RepoResult<()>;
    /// Soft-deletes a record. Unknown ids are a silent no-op.
    ///
    /// # Errors
    /// - `EmptyId` for an empty or blank id.
    /// - `Validation(MissingActor)` when `deleted_by` is blank.
    fn delete(&self, ctx: &OperationContext, id: &str, deleted_by: &str) -> RepoResult<()>;
}

/// SQLite-backed gallery experience repository.
pub struct SqliteGalleryExperienceRepository<'conn> {
    conn: &'conn Connection,
    events: Arc<dyn RepoEventSink>,
    progress_interval_ops: i32,
}

impl<'conn> SqliteGalleryExperienceRepository<'conn> {
    /// Constructs a repository from a connection that already holds the
    /// `gallery_experiences` table.
    ///
    /// The repository takes over the connection's SQLite progress handler to
    /// abort cancelled statements: each call replaces any handler the caller
    /// registered and clears it on return. Use `with_config` with
    /// `progress_interval_ops = 0` to keep a caller-owned handler; cancelled
    /// or expired contexts are then only refused before SQL starts.
    ///
    /// # Errors
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the table does
    ///   not match `COLUMNS`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self {
            conn,
            events: Arc::new(LogEventSink),
            progress_interval_ops: DEFAULT_PROGRESS_INTERVAL_OPS,
        })
    }

    /// Routes call outcomes to `events` instead of the `log` facade.
    pub fn with_event_sink(mut self, events: Arc<dyn RepoEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Applies repository settings; see `StoreConfig::progress_interval_ops`
    /// for the progress handler contract.
    pub fn with_config(mut self, config: &StoreConfig) -> Self {
        self.progress_interval_ops = config.progress_interval_ops;
        self
    }

    fn run<T>(
        &self,
        ctx: &OperationContext,
        operation: RepoOperation,
        target_id: Option<&str>,
        body: impl FnOnce() -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = if ctx.is_done() {
            Err(RepoError::Cancelled)
        } else {
            let _guard = InterruptGuard::install(self.conn, ctx, self.progress_interval_ops);
            body()
        };

        let event = RepoEvent {
            operation,
            target_id: target_id.map(str::to_string),
            duration_ms: started_at.elapsed().as_millis(),
            error: result.as_ref().err().map(ToString::to_string),
        };
        // A panicking sink loses its event, never the call's result.
        let _ = panic::catch_unwind(AssertUnwindSafe(|| self.events.record(&event)));
        result
    }
}

impl GalleryExperienceRepository for SqliteGalleryExperienceRepository<'_> {
    fn get_by_id(&self, ctx: &OperationContext, id: &str) -> RepoResult<GalleryExperience> {
        self.run(ctx, RepoOperation::GetById, Some(id), || {
            if id.trim().is_empty() {
                return Err(RepoError::EmptyId);
            }

            let mut stmt = self
                .conn
                .prepare(&format!("{} WHERE {ID} = ?1;", SELECT_SQL.as_str()))?;
            let mut rows = stmt.query([id])?;
            if let Some(row) = rows.next()? {
                return parse_experience_row(row);
            }

            Err(RepoError::NotFound(id.to_string()))
        })
    }

    fn list(
        &self,
        ctx: &OperationContext,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<GalleryExperience>> {
        self.run(ctx, RepoOperation::List, None, || {
            let mut stmt = self.conn.prepare(&format!(
                "{} WHERE {VISIBLE_FILTER}
                 ORDER BY {CREATED_DATE} ASC, {ID} ASC
                 LIMIT ?1 OFFSET ?2;",
                SELECT_SQL.as_str()
            ))?;
            let mut rows = stmt.query(params![i64::from(limit), i64::from(offset)])?;
            let mut experiences = Vec::new();
            while let Some(row) = rows.next()? {
                experiences.push(parse_experience_row(row)?);
            }
            Ok(experiences)
        })
    }

    fn count(&self, ctx: &OperationContext) -> RepoResult<u64> {
        self.run(ctx, RepoOperation::Count, None, || {
            let count: i64 = self.conn.query_row(
                &format!("SELECT count(*) FROM {GALLERY_EXPERIENCES_TABLE} WHERE {VISIBLE_FILTER};"),
                [],
                |row| row.get(0),
            )?;
            u64::try_from(count)
                .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
        })
    }

    fn insert(&self, ctx: &OperationContext, experience: &GalleryExperience) -> RepoResult<()> {
        self.run(ctx, RepoOperation::Insert, Some(experience.id.as_str()), || {
            experience.validate()?;

            self.conn.execute(
                INSERT_SQL.as_str(),
                named_params! {
                    ":id": experience.id,
                    ":created_by": experience.created_by,
                    ":created_date": format_timestamp(now_millis()),
                    ":modified_by": None::<String>,
                    ":modified_date": None::<String>,
                    ":deleted_by": None::<String>,
                    ":deleted_date": None::<String>,
                    ":is_deleted": bool_to_int(false),
                    ":is_active": bool_to_int(true),
                    ":experience_name": experience.experience_name,
                    ":experience_desc": experience.experience_desc,
                    ":experience_picture": experience.experience_picture,
                    ":longitude": experience.longitude,
                    ":latitude": experience.latitude,
                },
            )?;
            Ok(())
        })
    }

    fn update(&self, ctx: &OperationContext, experience: &GalleryExperience) -> RepoResult<()> {
        self.run(ctx, RepoOperation::Update, Some(experience.id.as_str()), || {
            experience.validate()?;
            require_actor("modified_by", experience.modified_by.as_deref())?;

            let affected = self.conn.execute(
                "UPDATE gallery_experiences
                 SET
                    modified_by = :modified_by,
                    modified_date = :modified_date,
                    experience_name = :experience_name,
                    experience_desc = :experience_desc,
                    experience_picture = :experience_picture,
                    longitude = :longitude,
                    latitude = :latitude
                 WHERE id = :id;",
                named_params! {
                    ":modified_by": experience.modified_by,
                    ":modified_date": format_timestamp(now_millis()),
                    ":experience_name": experience.experience_name,
                    ":experience_desc": experience.experience_desc,
                    ":experience_picture": experience.experience_picture,
                    ":longitude": experience.longitude,
                    ":latitude": experience.latitude,
                    ":id": experience.id,
                },
            )?;

            if affected != 1 {
                return Err(RepoError::AffectedRowMismatch {
                    id: experience.id.clone(),
                    affected,
                });
            }
            Ok(())
        })
    }

    fn delete(&self, ctx: &OperationContext, id: &str, deleted_by: &str) -> RepoResult<()> {
        self.run(ctx, RepoOperation::Delete, Some(id), || {
            if id.trim().is_empty() {
                return Err(RepoError::EmptyId);
            }
            require_actor("deleted_by", Some(deleted_by))?;

            // Affected rows are deliberately ignored: deleting an unknown id
            // is not an error.
            self.conn.execute(
                "UPDATE gallery_experiences
                 SET
                    deleted_by = ?1,
                    deleted_date = ?2,
                    is_deleted = 1,
                    is_active = 0
                 WHERE id = ?3;",
                params![deleted_by, format_timestamp(now_millis()), id],
            )?;
            Ok(())
        })
    }
}

fn parse_experience_row(row: &Row<'_>) -> RepoResult<GalleryExperience> {
    Ok(GalleryExperience {
        id: get_column(row, ID)?,
        created_by: get_column(row, CREATED_BY)?,
        created_date: parse_date_column(row, CREATED_DATE)?,
        modified_by: get_column(row, MODIFIED_BY)?,
        modified_date: parse_date_column(row, MODIFIED_DATE)?,
        deleted_by: get_column(row, DELETED_BY)?,
        deleted_date: parse_date_column(row, DELETED_DATE)?,
        is_deleted: parse_flag_column(row, IS_DELETED)?,
        is_active: parse_flag_column(row, IS_ACTIVE)?,
        experience_name: get_column(row, EXPERIENCE_NAME)?,
        experience_desc: get_column(row, EXPERIENCE_DESC)?,
        experience_picture: get_column(row, EXPERIENCE_PICTURE)?,
        longitude: get_column(row, LONGITUDE)?,
        latitude: get_column(row, LATITUDE)?,
    })
}

fn get_column<T: rusqlite::types::FromSql>(row: &Row<'_>, column: &str) -> RepoResult<T> {
    row.get(column).map_err(RepoError::Scan)
}

fn parse_date_column(row: &Row<'_>, column: &str) -> RepoResult<Option<DateTime<Utc>>> {
    match get_column::<Option<String>>(row, column)? {
        Some(text) => parse_timestamp(&text).map(Some).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{text}` in {GALLERY_EXPERIENCES_TABLE}.{column}: {err}"
            ))
        }),
        None => Ok(None),
    }
}

fn parse_flag_column(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match get_column::<i64>(row, column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in {GALLERY_EXPERIENCES_TABLE}.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, GALLERY_EXPERIENCES_TABLE)? {
        return Err(RepoError::MissingRequiredTable(GALLERY_EXPERIENCES_TABLE));
    }

    let present = table_columns(conn, GALLERY_EXPERIENCES_TABLE)?;
    for column in COLUMNS {
        if !present.iter().any(|current| current == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: GALLERY_EXPERIENCES_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

//! Repository event reporting.
//!
//! # Responsibility
//! - Describe the outcome of each repository call as a metadata-only event.
//! - Let callers choose where events go instead of writing to a global logger
//!   from inside the store.
//!
//! # Invariants
//! - Events never carry record content, only ids, operation names and errors.
//! - A sink that panics drops its event; the repository call still returns
//!   its own result.

use log::{error, info};

/// Repository operation that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoOperation {
    GetById,
    List,
    Count,
    Insert,
    Update,
    Delete,
}

impl RepoOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetById => "get_by_id",
            Self::List => "list",
            Self::Count => "count",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Outcome of one repository call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEvent {
    pub operation: RepoOperation,
    /// Target id for single-record operations.
    pub target_id: Option<String>,
    pub duration_ms: u128,
    /// Rendered error when the call failed.
    pub error: Option<String>,
}

impl RepoEvent {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Receiver of repository events.
pub trait RepoEventSink: Send + Sync {
    fn record(&self, event: &RepoEvent);
}

/// Forwards events to the `log` facade.
///
/// Successful calls log at `info`, failures at `error`, using the same
/// `event=... module=... status=...` layout as `db_open`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl RepoEventSink for LogEventSink {
    fn record(&self, event: &RepoEvent) {
        let target = event.target_id.as_deref().unwrap_or("-");
        match &event.error {
            None => info!(
                "event=repo_{} module=repo status=ok id={} duration_ms={}",
                event.operation.as_str(),
                target,
                event.duration_ms
            ),
            Some(err) => error!(
                "event=repo_{} module=repo status=error id={} duration_ms={} error={}",
                event.operation.as_str(),
                target,
                event.duration_ms,
                err
            ),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl RepoEventSink for NoopEventSink {
    fn record(&self, _event: &RepoEvent) {}
}

//! Store tuning knobs.
//!
//! Embedded by callers into their own configuration files; every field has a
//! default so partial documents deserialize.

use crate::context::DEFAULT_PROGRESS_INTERVAL_OPS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Connection and repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// SQLite VM instructions between cancellation checks. `0` disables
    /// in-flight cancellation and leaves the connection's progress handler
    /// to its owner.
    pub progress_interval_ops: i32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            progress_interval_ops: DEFAULT_PROGRESS_INTERVAL_OPS,
        }
    }
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

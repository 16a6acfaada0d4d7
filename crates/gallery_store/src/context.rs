//! Cooperative cancellation for repository calls.
//!
//! # Responsibility
//! - Carry an optional deadline and a shared cancel flag into each call.
//! - Abort in-flight SQLite statements once the context is done.
//!
//! # Invariants
//! - A context that is done never starts new SQL work.
//! - The progress handler installed for a call is removed on every exit path.
//! - With a zero progress interval the connection's progress handler is never
//!   touched.

use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of SQLite VM instructions between cancellation checks.
///
/// Zero disables in-flight cancellation; done contexts are still refused
/// before any SQL runs.
pub const DEFAULT_PROGRESS_INTERVAL_OPS: i32 = 1_000;

/// Cloneable handle that cancels every context sharing it.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-call cancellation and deadline carrier.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancel: CancelHandle,
}

impl OperationContext {
    /// Context that never expires and is only done when cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancelHandle::default(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns a handle that can cancel this context from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Returns whether the context was cancelled or its deadline passed.
    pub fn is_done(&self) -> bool {
        context_done(&self.cancel.flag, self.deadline)
    }
}

fn context_done(flag: &AtomicBool, deadline: Option<Instant>) -> bool {
    flag.load(Ordering::SeqCst) || deadline.is_some_and(|at| Instant::now() >= at)
}

/// Keeps a cancellation progress handler installed on a connection.
///
/// SQLite allows one progress handler per connection and it cannot be read
/// back, so installing replaces any handler the connection owner registered
/// and dropping the guard leaves the connection with none.
pub(crate) struct InterruptGuard<'conn> {
    conn: &'conn Connection,
}

impl<'conn> InterruptGuard<'conn> {
    /// Installs the handler, or returns `None` when `interval_ops` is not
    /// positive and in-flight cancellation is disabled.
    pub(crate) fn install(
        conn: &'conn Connection,
        ctx: &OperationContext,
        interval_ops: i32,
    ) -> Option<Self> {
        if interval_ops <= 0 {
            return None;
        }
        let flag = Arc::clone(&ctx.cancel.flag);
        let deadline = ctx.deadline;
        // Returning `true` makes SQLite abort the running statement with
        // SQLITE_INTERRUPT.
        conn.progress_handler(interval_ops, Some(move || context_done(&flag, deadline)));
        Some(Self { conn })
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}

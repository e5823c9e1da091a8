//! Identifier types for runtime entities.
//!
//! These types provide type-safe identifiers for workers and tasks. Nothing
//! in this crate indexes a slab by identifier, so they wrap a plain `u64`
//! drawn from a global counter: unique for the lifetime of the process and
//! cheap to copy into log events.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_WORKER: AtomicU64 = AtomicU64::new(1);
static NEXT_TASK: AtomicU64 = AtomicU64::new(1);

/// A unique identifier for a worker in a worker group.
///
/// Transports stamp each connection with the identifier of the worker
/// servicing it; the sticky execution strategy uses that stamp to select the
/// execution context bound to the same worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u64);

impl WorkerId {
    /// Allocates the next unique worker identifier.
    pub(crate) fn next() -> Self {
        Self(NEXT_WORKER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a worker identifier from a raw value.
    ///
    /// Intended for transports that persist worker identities or report
    /// workers this process has never seen; an identifier that matches no
    /// group member simply resolves to the fallback context.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// A unique identifier for one running instance of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocates the next unique task identifier.
    pub(crate) fn next() -> Self {
        Self(NEXT_TASK.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

//! Test utilities for execbridge.
//!
//! This module provides shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - A minimal `block_on` runner and bounded spin-waiting
//! - Outcome assertion macros
//! - A stub connection for bridge-level tests
//!
//! # Example
//! ```
//! use execbridge::test_utils::{block_on, init_test_logging};
//!
//! init_test_logging();
//! let value = block_on(async { 1 + 1 });
//! assert_eq!(value, 2);
//! ```

use crate::server::{CloseSignal, Connection};
use crate::types::WorkerId;
use std::future::Future;
use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::task::{Context, Poll, Wake, Waker};
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Acquire the global environment lock for tests that mutate env vars.
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().expect("env lock poisoned")
}

struct NoopWaker;

impl Wake for NoopWaker {
    fn wake(self: Arc<Self>) {}
}

/// Drives a future to completion on the calling thread.
///
/// Busy-polls with a no-op waker, yielding the thread between polls. Suited
/// to tests whose futures complete through inline execution or through
/// worker threads making independent progress.
pub fn block_on<F: Future>(future: F) -> F::Output {
    let waker = Waker::from(Arc::new(NoopWaker));
    let mut cx = Context::from_waker(&waker);
    let mut future = pin!(future);
    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(value) => return value,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

/// Spins until `predicate` returns true, panicking after `timeout`.
///
/// # Panics
///
/// Panics with `description` if the predicate does not hold within the
/// timeout.
pub fn spin_until(description: &str, timeout: Duration, mut predicate: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !predicate() {
        assert!(
            Instant::now() < deadline,
            "condition not reached within {timeout:?}: {description}"
        );
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Assert that an outcome is `Success` with a specific value.
#[macro_export]
macro_rules! assert_outcome_success {
    ($outcome:expr, $expected:expr) => {
        match $outcome {
            $crate::outcome::Outcome::Success(v) => assert_eq!(v, $expected),
            other => unreachable!("expected Outcome::Success({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that an outcome is `Empty`.
#[macro_export]
macro_rules! assert_outcome_empty {
    ($outcome:expr) => {
        match $outcome {
            $crate::outcome::Outcome::Empty => {}
            other => unreachable!("expected Outcome::Empty, got {:?}", other),
        }
    };
}

/// Assert that an outcome is an expected failure with a specific value.
#[macro_export]
macro_rules! assert_outcome_fail {
    ($outcome:expr, $expected:expr) => {
        match $outcome {
            $crate::outcome::Outcome::Failure($crate::outcome::Cause::Fail(e)) => {
                assert_eq!(e, $expected);
            }
            other => unreachable!("expected Failure(Fail({:?})), got {:?}", $expected, other),
        }
    };
}

/// Assert that a task outcome is `Interrupted`.
#[macro_export]
macro_rules! assert_task_interrupted {
    ($outcome:expr) => {
        match $outcome {
            $crate::runtime::TaskOutcome::Interrupted(_) => {}
            other => unreachable!("expected TaskOutcome::Interrupted, got {:?}", other),
        }
    };
}

/// Stub connection for bridge-level tests.
///
/// Backed by a [`CloseSignal`]; records how many times the bridge closed it.
/// [`StubConnection::fire_close`] simulates a transport-initiated close.
#[derive(Debug)]
pub struct StubConnection {
    signal: CloseSignal,
    worker: WorkerId,
    closes: AtomicUsize,
}

impl StubConnection {
    /// Creates a stub connection owned by the given worker.
    #[must_use]
    pub fn new(worker: WorkerId) -> Self {
        Self {
            signal: CloseSignal::new(),
            worker,
            closes: AtomicUsize::new(0),
        }
    }

    /// Simulates the transport closing the connection.
    pub fn fire_close(&self) {
        self.signal.fire();
    }

    /// Returns how many times [`Connection::close`] was called.
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Connection for StubConnection {
    fn on_close(&self, listener: Box<dyn FnOnce() + Send>) {
        self.signal.on_close(listener);
    }

    fn current_worker(&self) -> WorkerId {
        self.worker
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.signal.fire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_on_returns_value() {
        assert_eq!(block_on(async { 7 }), 7);
    }

    #[test]
    fn stub_connection_counts_closes() {
        let conn = StubConnection::new(WorkerId::from_raw(1));
        assert_eq!(conn.close_count(), 0);
        conn.close();
        conn.close();
        assert_eq!(conn.close_count(), 2);
        assert_eq!(conn.current_worker(), WorkerId::from_raw(1));
    }

    #[test]
    fn spin_until_passes_when_condition_holds() {
        spin_until("immediately true", Duration::from_secs(1), || true);
    }
}

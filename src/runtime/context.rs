//! Execution contexts: the injectable spawning surface.
//!
//! An [`ExecutionContext`] is a value capable of starting programs as
//! interruptible tasks on some [`Executor`]. Contexts are threaded through
//! constructors explicitly — never read from a hidden global — so tests can
//! supply deterministic executors.
//!
//! A context comes in two flavors:
//!
//! - the base flavor yields on start: `spawn` enqueues the task and returns,
//!   and the first poll happens wherever the executor runs it;
//! - a flavor derived through [`ExecutionContext::on_executor`] does not
//!   yield on start: `spawn` polls the task once synchronously on the calling
//!   thread, so everything the program does before its first suspension —
//!   notably close-listener registration — has happened by the time `spawn`
//!   returns. Subsequent polls run on the derived executor.

use crate::runtime::executor::{run_inline, Executor, InlineExecutor, Runnable};
use crate::runtime::task::{create_task, CancelToken, TaskHandle, TaskOutcome};
use core::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

/// An object capable of starting asynchronous programs and reporting their
/// terminal outcomes.
#[derive(Clone)]
pub struct ExecutionContext {
    executor: Arc<dyn Executor>,
    yield_on_start: bool,
}

impl ExecutionContext {
    /// Creates a context over the given executor.
    ///
    /// The context yields on start: spawned tasks are enqueued, not polled
    /// inline.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            yield_on_start: true,
        }
    }

    /// Creates a context over the deterministic inline executor.
    #[must_use]
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineExecutor::new()))
    }

    /// Derives a context rebound onto `executor`.
    ///
    /// The derived context does not yield on start and runs all scheduled
    /// work via `executor` instead of this context's own.
    #[must_use]
    pub fn on_executor(&self, executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            yield_on_start: false,
        }
    }

    /// Returns whether spawned tasks yield before their first poll.
    #[must_use]
    pub const fn yields_on_start(&self) -> bool {
        self.yield_on_start
    }

    /// Starts `program` as an interruptible task.
    ///
    /// The returned handle can request interruption and await the terminal
    /// outcome; dropping it leaves the task running.
    pub fn spawn<F, T, E>(&self, program: F) -> TaskHandle<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.spawn_with_token(program, |_| {}, CancelToken::new())
    }

    /// Starts `program` as an interruptible task with a completion observer.
    ///
    /// `observer` is invoked exactly once, with a reference to the terminal
    /// outcome, on whichever thread drives the task to completion.
    pub fn spawn_observed<F, O, T, E>(&self, program: F, observer: O) -> TaskHandle<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        O: FnOnce(&TaskOutcome<T, E>) + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.spawn_with_token(program, observer, CancelToken::new())
    }

    /// Starts `program` with a caller-supplied cancellation token.
    ///
    /// Used when the interruption wiring must exist before the task starts —
    /// the runtime bridge embeds the token in a close listener the program
    /// registers as its first step.
    pub fn spawn_with_token<F, O, T, E>(
        &self,
        program: F,
        observer: O,
        token: CancelToken,
    ) -> TaskHandle<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        O: FnOnce(&TaskOutcome<T, E>) + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (future, handle) = create_task(program, Box::new(observer), token);
        let runnable = Runnable::new(future, Arc::clone(&self.executor));
        trace!(
            task = %handle.task_id(),
            yield_on_start = self.yield_on_start,
            "task spawned"
        );
        if self.yield_on_start {
            self.executor.schedule(runnable);
        } else {
            // First poll runs synchronously on the calling thread; wakes
            // reschedule onto the derived executor.
            run_inline(runnable);
        }
        handle
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("executor", &self.executor)
            .field("yield_on_start", &self.yield_on_start)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::task::TaskState;
    use crate::runtime::yield_now::yield_now;
    use crate::test_utils::block_on;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[test]
    fn inline_context_runs_to_completion_on_spawn() {
        let context = ExecutionContext::inline();
        let handle = context.spawn(async { Ok::<i32, i32>(5) });
        assert!(handle.is_finished());
        let outcome = block_on(handle.join());
        assert!(matches!(outcome, TaskOutcome::Completed(5)));
    }

    #[test]
    fn derived_context_polls_once_before_returning() {
        // An executor that never runs anything: queued work just accumulates.
        #[derive(Debug)]
        struct Parked(Mutex<Vec<Runnable>>);
        impl Executor for Parked {
            fn schedule(&self, runnable: Runnable) {
                self.0.lock().expect("parked queue poisoned").push(runnable);
            }
        }

        let reached_first_step = Arc::new(AtomicBool::new(false));
        let probe = Arc::clone(&reached_first_step);
        let parked = Arc::new(Parked(Mutex::new(Vec::new())));
        let derived = ExecutionContext::inline().on_executor(parked);

        let handle = derived.spawn(async move {
            probe.store(true, Ordering::SeqCst);
            yield_now().await;
            Ok::<(), i32>(())
        });

        // The program ran up to its first suspension inside spawn, even
        // though the target executor never polled anything.
        assert!(reached_first_step.load(Ordering::SeqCst));
        assert_eq!(handle.state(), TaskState::Running);
    }

    #[test]
    fn base_context_yields_on_start() {
        let context = ExecutionContext::inline();
        assert!(context.yields_on_start());
        assert!(!context.on_executor(Arc::new(InlineExecutor::new())).yields_on_start());
    }

    #[test]
    fn observer_sees_terminal_outcome() {
        let saw_failure = Arc::new(AtomicBool::new(false));
        let probe = Arc::clone(&saw_failure);
        let context = ExecutionContext::inline();
        let _handle = context.spawn_observed(
            async { Err::<(), &str>("nope") },
            move |outcome: &TaskOutcome<(), &str>| {
                probe.store(outcome.is_failed(), Ordering::SeqCst);
            },
        );
        assert!(saw_failure.load(Ordering::SeqCst));
    }
}

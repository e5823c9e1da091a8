//! The runtime bridge: running programs on behalf of connections.
//!
//! [`RuntimeBridge::run`] is the single operation transports call per
//! accepted connection. It resolves the execution context through the
//! bridge's strategy, starts the program as an interruptible task, wires
//! connection-close to task interruption, and handles the terminal outcome:
//!
//! | Terminal outcome              | Action                               |
//! |-------------------------------|--------------------------------------|
//! | `Completed`                   | none                                 |
//! | `Interrupted`                 | none (never logged, never a failure) |
//! | `Failed`, no defect           | close the connection, silently       |
//! | `Failed`, defect              | log the defect, close the connection |
//!
//! Higher layers are responsible for producing any client-visible error
//! response before failing; from this core's perspective recoverable
//! failures fail closed but silent.

use crate::runtime::{CancelToken, ExecutionContext, TaskOutcome, WorkerGroup};
use crate::server::connection::Connection;
use crate::server::strategy::ExecutionStrategy;
use crate::types::CancelReason;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{error, trace};

/// A suspension boundary that observes pending interruption requests.
///
/// Ready immediately when no interruption is pending, so the common path
/// stays suspension-free. When the close listener fired during its own
/// registration — the connection was already gone — this checkpoint suspends
/// instead of letting the program body start.
struct CancelCheckpoint {
    token: CancelToken,
}

impl Future for CancelCheckpoint {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.token.is_cancelled() {
            cx.waker().wake_by_ref();
            Poll::Pending
        } else {
            Poll::Ready(())
        }
    }
}

/// Runs programs against connections according to an execution strategy.
#[derive(Debug)]
pub struct RuntimeBridge {
    strategy: ExecutionStrategy,
}

impl RuntimeBridge {
    /// Builds a bridge from an existing strategy.
    #[must_use]
    pub const fn new(strategy: ExecutionStrategy) -> Self {
        Self { strategy }
    }

    /// Builds a bridge over the default strategy for `base`.
    #[must_use]
    pub const fn default_bridge(base: ExecutionContext) -> Self {
        Self::new(ExecutionStrategy::default_strategy(base))
    }

    /// Builds a bridge over a dedicated strategy for `base` and `group`.
    #[must_use]
    pub fn dedicated(base: &ExecutionContext, group: &WorkerGroup) -> Self {
        Self::new(ExecutionStrategy::dedicated(base, group))
    }

    /// Builds a bridge over a sticky strategy for `base` and `group`.
    #[must_use]
    pub fn sticky(base: &ExecutionContext, group: &WorkerGroup) -> Self {
        Self::new(ExecutionStrategy::sticky(base, group))
    }

    /// Returns the strategy this bridge consults.
    #[must_use]
    pub const fn strategy(&self) -> &ExecutionStrategy {
        &self.strategy
    }

    /// Runs `program` on behalf of `connection`.
    ///
    /// Fire-and-forget: returns without a result value; all outcomes are
    /// handled internally as described in the [module docs](self).
    ///
    /// The close listener that interrupts the task is registered as the
    /// program's own first step, before any other suspension. On contexts
    /// derived by the dedicated and sticky strategies — which do not yield
    /// on start — that step has executed by the time `run` returns. On the
    /// default strategy's base context the task is enqueued first, so a
    /// window remains in which closing the connection does not yet interrupt
    /// the program; if the program completes before the listener registers,
    /// the close simply finds nothing left to interrupt. The residual window
    /// is a known, bounded limitation of the start ordering.
    pub fn run<C, F, E>(&self, connection: &Arc<C>, program: F)
    where
        C: Connection + 'static,
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Send + 'static,
    {
        let context = self.strategy.context_for(connection.as_ref());
        let token = CancelToken::new();

        let wired = {
            let connection = Arc::clone(connection);
            let checkpoint = CancelCheckpoint {
                token: token.clone(),
            };
            let cancel = token.clone();
            async move {
                connection.on_close(Box::new(move || {
                    cancel.cancel(CancelReason::connection_closed());
                }));
                checkpoint.await;
                program.await
            }
        };

        let observer = {
            let connection = Arc::clone(connection);
            move |outcome: &TaskOutcome<(), E>| match outcome {
                TaskOutcome::Completed(()) | TaskOutcome::Interrupted(_) => {}
                TaskOutcome::Failed(cause) => {
                    if let Some(defect) = cause.defect() {
                        error!(%defect, "program failed with defect; closing connection");
                    }
                    connection.close();
                }
            }
        };

        let handle = context.spawn_with_token(wired, observer, token);
        trace!(task = %handle.task_id(), "program started for connection");
    }
}

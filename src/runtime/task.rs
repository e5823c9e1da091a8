//! Task lifecycle: states, terminal outcomes, cancellation, join handles.
//!
//! Every program started through an
//! [`ExecutionContext`](crate::runtime::ExecutionContext) becomes one task.
//! A task moves `Created → Running → {Completed, Failed, Interrupted}`; the
//! terminal transition happens exactly once, and anything arriving after it
//! — a second completion, a late interruption request — is a safe no-op.
//!
//! Interruption is a request, not preemption: a [`CancelToken`] marks the
//! task and wakes it, and the task observes the mark at its next suspension
//! boundary. A non-suspending computation cannot be stopped mid-step.

use crate::outcome::Cause;
use crate::types::{CancelReason, DefectPayload, TaskId};
use core::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use tracing::trace;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Spawned but not yet polled.
    Created = 0,
    /// Polled at least once, not yet terminal.
    Running = 1,
    /// Finished with a success value.
    Completed = 2,
    /// Finished with a failure cause.
    Failed = 3,
    /// Interrupted before producing a result.
    Interrupted = 4,
}

impl TaskState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Failed,
            _ => Self::Interrupted,
        }
    }

    /// Returns true if this state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Interrupted)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
            Self::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// The terminal outcome of a task.
#[derive(Debug)]
pub enum TaskOutcome<T, E> {
    /// The program finished with a success value.
    Completed(T),
    /// The program finished with a failure cause — an expected error value or
    /// a defect (a panic caught at the task boundary).
    Failed(Cause<E>),
    /// The program was interrupted before producing a result.
    Interrupted(CancelReason),
}

impl<T, E> TaskOutcome<T, E> {
    /// Returns true if the task completed successfully.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns true if the task failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true if the task was interrupted.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }

    /// Returns the defect carried by a failure outcome, if any.
    #[must_use]
    pub const fn defect(&self) -> Option<&DefectPayload> {
        match self {
            Self::Failed(cause) => cause.defect(),
            _ => None,
        }
    }

    const fn state(&self) -> TaskState {
        match self {
            Self::Completed(_) => TaskState::Completed,
            Self::Failed(_) => TaskState::Failed,
            Self::Interrupted(_) => TaskState::Interrupted,
        }
    }
}

/// Shared token state.
#[derive(Debug)]
struct TokenInner {
    cancelled: AtomicBool,
    reason: Mutex<Option<CancelReason>>,
    waker: Mutex<Option<Waker>>,
}

/// An explicit, idempotent interruption handle.
///
/// Cancellation is fire-and-forget: [`CancelToken::cancel`] records the
/// request and wakes the task, without waiting for — or reporting — the
/// task's teardown. The first call wins; later calls, including calls made
/// after the task already reached a terminal state, are no-ops.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                reason: Mutex::new(None),
                waker: Mutex::new(None),
            }),
        }
    }

    /// Requests interruption of the associated task.
    pub fn cancel(&self, reason: CancelReason) {
        {
            let mut slot = self.inner.reason.lock().expect("cancel reason poisoned");
            if self.inner.cancelled.load(Ordering::Acquire) {
                return;
            }
            *slot = Some(reason);
            self.inner.cancelled.store(true, Ordering::Release);
        }
        let waker = self.inner.waker.lock().expect("cancel waker poisoned").take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Returns true if interruption has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Returns the recorded reason if interruption has been requested.
    #[must_use]
    pub fn cancelled_reason(&self) -> Option<CancelReason> {
        if !self.is_cancelled() {
            return None;
        }
        self.inner.reason.lock().expect("cancel reason poisoned").clone()
    }

    /// Registers the waker to notify when interruption is requested.
    fn register(&self, waker: &Waker) {
        let mut slot = self.inner.waker.lock().expect("cancel waker poisoned");
        match slot.as_ref() {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared between a running task, its handle, and its joiner.
pub(crate) struct TaskCell<T, E> {
    id: TaskId,
    state: AtomicU8,
    outcome: Mutex<Option<TaskOutcome<T, E>>>,
    join_waker: Mutex<Option<Waker>>,
}

impl<T, E> TaskCell<T, E> {
    fn new(id: TaskId) -> Self {
        Self {
            id,
            state: AtomicU8::new(TaskState::Created as u8),
            outcome: Mutex::new(None),
            join_waker: Mutex::new(None),
        }
    }

    fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn mark_running(&self) {
        let _ = self.state.compare_exchange(
            TaskState::Created as u8,
            TaskState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Attempts the exactly-once terminal transition. Returns true if this
    /// caller won; false if the task was already terminal.
    fn transition_terminal(&self, target: TaskState) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if TaskState::from_u8(current).is_terminal() {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                target as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    fn store_outcome(&self, outcome: TaskOutcome<T, E>) {
        *self.outcome.lock().expect("task outcome poisoned") = Some(outcome);
        let waker = self.join_waker.lock().expect("join waker poisoned").take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Observer invoked exactly once with a task's terminal outcome.
type Observer<T, E> = Box<dyn FnOnce(&TaskOutcome<T, E>) + Send>;

/// The wrapper future that drives a program and enforces task semantics:
/// interruption at poll boundaries, panic capture, exactly-once terminal
/// transition, interruption-on-drop.
pub(crate) struct TaskFuture<T, E> {
    program: Option<Pin<Box<dyn Future<Output = Result<T, E>> + Send>>>,
    cell: Arc<TaskCell<T, E>>,
    token: CancelToken,
    observer: Option<Observer<T, E>>,
}

impl<T, E> TaskFuture<T, E> {
    fn complete(&mut self, outcome: TaskOutcome<T, E>) {
        let target = outcome.state();
        if !self.cell.transition_terminal(target) {
            return;
        }
        trace!(task = %self.cell.id, state = %target, "task reached terminal state");
        if let Some(observer) = self.observer.take() {
            observer(&outcome);
        }
        self.cell.store_outcome(outcome);
    }
}

impl<T, E> Future for TaskFuture<T, E> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.cell.state().is_terminal() {
            return Poll::Ready(());
        }
        if let Some(reason) = this.token.cancelled_reason() {
            this.program = None;
            this.complete(TaskOutcome::Interrupted(reason));
            return Poll::Ready(());
        }
        this.cell.mark_running();
        this.token.register(cx.waker());

        let Some(program) = this.program.as_mut() else {
            return Poll::Ready(());
        };
        match catch_unwind(AssertUnwindSafe(|| program.as_mut().poll(cx))) {
            Err(payload) => {
                this.program = None;
                this.complete(TaskOutcome::Failed(Cause::die(DefectPayload::from_panic(
                    payload,
                ))));
                Poll::Ready(())
            }
            Ok(Poll::Ready(Ok(value))) => {
                this.program = None;
                this.complete(TaskOutcome::Completed(value));
                Poll::Ready(())
            }
            Ok(Poll::Ready(Err(error))) => {
                this.program = None;
                this.complete(TaskOutcome::Failed(Cause::fail(error)));
                Poll::Ready(())
            }
            Ok(Poll::Pending) => Poll::Pending,
        }
    }
}

impl<T, E> Drop for TaskFuture<T, E> {
    fn drop(&mut self) {
        // A task torn down without reaching a terminal state (its queue was
        // dropped at executor shutdown) still reports an outcome.
        if !self.cell.state().is_terminal() {
            self.program = None;
            self.complete(TaskOutcome::Interrupted(CancelReason::shutdown()));
        }
    }
}

/// A handle to a spawned task.
///
/// The handle does not own the task: dropping it leaves the task running.
/// It provides the task id, interruption, and — consuming the handle — a
/// future for the terminal outcome.
pub struct TaskHandle<T, E> {
    cell: Arc<TaskCell<T, E>>,
    token: CancelToken,
}

impl<T, E> TaskHandle<T, E> {
    /// Returns the task id.
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.cell.id
    }

    /// Returns the task's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.cell.state()
    }

    /// Returns true if the task has reached a terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cell.state().is_terminal()
    }

    /// Requests interruption of the task.
    ///
    /// This is a request — the task observes it at its next suspension
    /// boundary. Requests against an already-terminated task are no-ops.
    pub fn cancel(&self, reason: CancelReason) {
        self.token.cancel(reason);
    }

    /// Returns a clone of the task's cancellation token.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Consumes the handle, returning a future for the terminal outcome.
    #[must_use]
    pub fn join(self) -> JoinFuture<T, E> {
        JoinFuture { cell: self.cell }
    }
}

impl<T, E> fmt::Debug for TaskHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("task_id", &self.cell.id)
            .field("state", &self.cell.state())
            .finish()
    }
}

/// Future returned by [`TaskHandle::join`].
#[must_use = "futures do nothing unless polled"]
pub struct JoinFuture<T, E> {
    cell: Arc<TaskCell<T, E>>,
}

impl<T, E> Future for JoinFuture<T, E> {
    type Output = TaskOutcome<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<TaskOutcome<T, E>> {
        // Register before checking so a completion between the check and the
        // return cannot be missed.
        *self.cell.join_waker.lock().expect("join waker poisoned") = Some(cx.waker().clone());
        if let Some(outcome) = self.cell.outcome.lock().expect("task outcome poisoned").take() {
            return Poll::Ready(outcome);
        }
        Poll::Pending
    }
}

/// Builds the task triple for a program: the erasable wrapper future, the
/// shared cell, and the caller-facing handle.
pub(crate) fn create_task<F, T, E>(
    program: F,
    observer: Observer<T, E>,
    token: CancelToken,
) -> (TaskFuture<T, E>, TaskHandle<T, E>)
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let id = TaskId::next();
    let cell = Arc::new(TaskCell::new(id));
    let future = TaskFuture {
        program: Some(Box::pin(program)),
        cell: Arc::clone(&cell),
        token: token.clone(),
        observer: Some(observer),
    };
    (future, TaskHandle { cell, token })
}

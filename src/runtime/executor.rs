//! Task scheduling surface and type-erased runnables.
//!
//! [`Executor`] is the object-safe seam between execution contexts and the
//! machinery that drives polls: a worker, a whole worker group, or the
//! deterministic inline executor used in tests. [`Runnable`] is the unit of
//! scheduling — a reference-counted, type-erased task cell whose waker
//! reschedules it onto its owning executor.
//!
//! Note: this implementation uses safe Rust only (no unsafe).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Wake, Waker};
use tracing::trace;

/// An object capable of scheduling runnables for execution.
///
/// Implementations must eventually either call [`Runnable::run`] on a
/// scheduled runnable or drop it; dropping a runnable that has not reached a
/// terminal state interrupts its task (see
/// [`TaskOutcome`](crate::runtime::TaskOutcome)).
pub trait Executor: Send + Sync + fmt::Debug {
    /// Schedules a runnable to be polled.
    fn schedule(&self, runnable: Runnable);
}

/// Shared core of a scheduled task.
struct RunnableCore {
    /// The pinned, type-erased future; `None` once complete.
    slot: Mutex<Option<Pin<Box<dyn Future<Output = ()> + Send>>>>,
    /// Guards against duplicate queue entries.
    queued: AtomicBool,
    /// Where wakes reschedule this runnable.
    executor: Arc<dyn Executor>,
    /// Poll counter (for tracing).
    polls: AtomicU64,
}

impl Wake for RunnableCore {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        // Already-queued wakes coalesce into the pending queue entry.
        if !self.queued.swap(true, Ordering::AcqRel) {
            self.executor.schedule(Runnable {
                core: Arc::clone(self),
            });
        }
    }
}

/// A reference-counted, type-erased task cell.
///
/// Created by [`ExecutionContext::spawn`](crate::runtime::ExecutionContext::spawn)
/// and handed to an [`Executor`]. Each queue entry polls the stored future
/// once; pending futures are re-queued by their waker.
pub struct Runnable {
    core: Arc<RunnableCore>,
}

impl Runnable {
    pub(crate) fn new<F>(future: F, executor: Arc<dyn Executor>) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            core: Arc::new(RunnableCore {
                slot: Mutex::new(Some(Box::pin(future))),
                queued: AtomicBool::new(false),
                executor,
                polls: AtomicU64::new(0),
            }),
        }
    }

    /// Polls the stored future once.
    ///
    /// The slot mutex serializes polls; wakes delivered while polling re-enter
    /// the owning executor's queue and are observed on the next entry. Calling
    /// `run` on a completed runnable is a no-op.
    pub fn run(&self) {
        self.core.queued.store(false, Ordering::Release);
        let waker = Waker::from(Arc::clone(&self.core));
        let mut cx = Context::from_waker(&waker);

        let mut slot = self.core.slot.lock().expect("runnable slot poisoned");
        let Some(mut future) = slot.take() else {
            return;
        };

        let poll_number = self.core.polls.fetch_add(1, Ordering::Relaxed) + 1;
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                trace!(poll_number, "runnable completed");
            }
            Poll::Pending => {
                *slot = Some(future);
            }
        }
    }
}

impl fmt::Debug for Runnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runnable")
            .field("queued", &self.core.queued.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

thread_local! {
    static INLINE_QUEUE: RefCell<VecDeque<Runnable>> = const { RefCell::new(VecDeque::new()) };
    static INLINE_DRAINING: Cell<bool> = const { Cell::new(false) };
}

/// Runs a runnable on the calling thread through the inline trampoline.
///
/// The trampoline keeps same-thread rescheduling flat: a runnable that wakes
/// itself while being polled (or schedules further inline work) lands in the
/// thread-local queue and is drained iteratively, never by re-entering
/// `Runnable::run` on a slot the current frame still holds.
pub(crate) fn run_inline(runnable: Runnable) {
    INLINE_QUEUE.with(|queue| queue.borrow_mut().push_back(runnable));
    if INLINE_DRAINING.get() {
        return;
    }
    INLINE_DRAINING.set(true);
    while let Some(next) = INLINE_QUEUE.with(|queue| queue.borrow_mut().pop_front()) {
        next.run();
    }
    INLINE_DRAINING.set(false);
}

/// A deterministic executor that runs tasks on the scheduling thread.
///
/// Useful as the ambient base context in tests and in single-threaded
/// embeddings: everything a task does happens synchronously on the thread
/// that scheduled it, in FIFO order. Cross-thread wakes still work — they run
/// the task on whichever thread delivered the wake.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl InlineExecutor {
    /// Creates a new inline executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Executor for InlineExecutor {
    fn schedule(&self, runnable: Runnable) {
        run_inline(runnable);
    }
}

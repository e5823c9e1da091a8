//! Worker groups: fixed pools of single-threaded event loops.
//!
//! Each worker owns one OS thread driving a cooperatively scheduled loop:
//! pop a runnable from the injection queue, poll it once, repeat; park when
//! idle. A [`WorkerGroup`] exposes the group as a whole (round-robin
//! scheduling) and each member individually, which is what the sticky
//! execution strategy pins connections to.
//!
//! Membership is fixed at construction. The member list returned by
//! [`WorkerGroup::members`] is the snapshot sticky strategies are built
//! from; it never changes for the life of the group.

use crate::runtime::config::{BuildError, GroupConfig};
use crate::runtime::executor::{Executor, Runnable};
use crate::types::WorkerId;
use core::fmt;
use crossbeam_queue::SegQueue;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, trace};

thread_local! {
    static CURRENT_WORKER: Cell<Option<WorkerId>> = const { Cell::new(None) };
}

/// Returns the identity of the worker driving the calling thread, if any.
///
/// Returns `None` on threads that are not worker-group members.
#[must_use]
pub fn current_worker() -> Option<WorkerId> {
    CURRENT_WORKER.get()
}

/// State shared between a worker thread and its executors.
struct WorkerShared {
    id: WorkerId,
    queue: SegQueue<Runnable>,
    /// Paired with `wakeup`: true while the worker is parked.
    idle: Mutex<bool>,
    wakeup: Condvar,
    shutdown: AtomicBool,
}

impl WorkerShared {
    /// Enqueues a runnable and unparks the worker.
    ///
    /// Runnables scheduled after shutdown are dropped, which interrupts
    /// their tasks.
    fn inject(&self, runnable: Runnable) {
        if self.shutdown.load(Ordering::Acquire) {
            drop(runnable);
            return;
        }
        self.queue.push(runnable);
        self.notify();
    }

    fn notify(&self) {
        // Taking the lock orders this notify after any in-progress park
        // decision; without it a push between the worker's empty-check and
        // its wait would be lost.
        drop(self.idle.lock().expect("worker idle lock poisoned"));
        self.wakeup.notify_one();
    }
}

fn worker_loop(shared: &Arc<WorkerShared>) {
    CURRENT_WORKER.set(Some(shared.id));
    trace!(worker = %shared.id, "worker started");
    loop {
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        while let Some(runnable) = shared.queue.pop() {
            runnable.run();
            if shared.shutdown.load(Ordering::Acquire) {
                break;
            }
        }
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        let mut idle = shared.idle.lock().expect("worker idle lock poisoned");
        if shared.queue.is_empty() && !shared.shutdown.load(Ordering::Acquire) {
            *idle = true;
            idle = shared.wakeup.wait(idle).expect("worker idle lock poisoned");
            *idle = false;
        }
        drop(idle);
    }
    trace!(worker = %shared.id, "worker stopped");
    // Runnables still queued here are dropped with the queue once the last
    // executor handle goes away; their tasks report Interrupted.
}

/// Executor scheduling onto one specific worker.
struct MemberExecutor {
    shared: Arc<WorkerShared>,
}

impl Executor for MemberExecutor {
    fn schedule(&self, runnable: Runnable) {
        self.shared.inject(runnable);
    }
}

impl fmt::Debug for MemberExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberExecutor")
            .field("worker", &self.shared.id)
            .finish()
    }
}

/// Executor scheduling onto the group as a whole (round-robin).
struct GroupExecutor {
    inner: Arc<GroupInner>,
}

impl Executor for GroupExecutor {
    fn schedule(&self, runnable: Runnable) {
        let index = self.inner.next.fetch_add(1, Ordering::Relaxed) % self.inner.workers.len();
        self.inner.workers[index].inject(runnable);
    }
}

impl fmt::Debug for GroupExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupExecutor")
            .field("workers", &self.inner.workers.len())
            .finish()
    }
}

struct GroupInner {
    workers: Vec<Arc<WorkerShared>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    next: AtomicUsize,
    shutdown: AtomicBool,
}

impl GroupInner {
    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        for worker in &self.workers {
            worker.shutdown.store(true, Ordering::Release);
            worker.notify();
        }
        let threads = std::mem::take(&mut *self.threads.lock().expect("thread list poisoned"));
        for thread in threads {
            // A worker that panicked already tore itself down; joining its
            // thread must not take the whole group down with it.
            let _ = thread.join();
        }
        debug!(workers = self.workers.len(), "worker group stopped");
    }
}

/// A fixed pool of workers, each driving a single-threaded event loop.
///
/// # Example
///
/// ```ignore
/// use execbridge::runtime::{GroupConfig, WorkerGroup};
///
/// let group = WorkerGroup::with_config(GroupConfig {
///     workers: 4,
///     ..GroupConfig::default()
/// })?;
///
/// for id in group.members() {
///     // one executor per member, for worker-pinned scheduling
///     let _executor = group.member_executor(id);
/// }
/// group.shutdown();
/// ```
pub struct WorkerGroup {
    inner: Arc<GroupInner>,
}

impl WorkerGroup {
    /// Creates a worker group with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ThreadSpawn`] if a worker thread cannot be
    /// spawned.
    pub fn new() -> Result<Self, BuildError> {
        Self::with_config(GroupConfig::default())
    }

    /// Creates a worker group from a configuration.
    ///
    /// The configuration is normalized first: zero workers becomes one, an
    /// empty thread-name prefix becomes the default.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ThreadSpawn`] if a worker thread cannot be
    /// spawned; workers already started are shut down before returning.
    pub fn with_config(mut config: GroupConfig) -> Result<Self, BuildError> {
        config.normalize();

        let inner = Arc::new(GroupInner {
            workers: (0..config.workers)
                .map(|_| {
                    Arc::new(WorkerShared {
                        id: WorkerId::next(),
                        queue: SegQueue::new(),
                        idle: Mutex::new(false),
                        wakeup: Condvar::new(),
                        shutdown: AtomicBool::new(false),
                    })
                })
                .collect(),
            threads: Mutex::new(Vec::with_capacity(config.workers)),
            next: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
        });

        for (index, shared) in inner.workers.iter().enumerate() {
            let thread_name = format!("{}-{index}", config.thread_name_prefix);
            let shared = Arc::clone(shared);
            let spawned = std::thread::Builder::new()
                .name(thread_name.clone())
                .stack_size(config.thread_stack_size)
                .spawn(move || worker_loop(&shared));
            match spawned {
                Ok(handle) => inner
                    .threads
                    .lock()
                    .expect("thread list poisoned")
                    .push(handle),
                Err(source) => {
                    inner.shutdown();
                    return Err(BuildError::ThreadSpawn {
                        thread: thread_name,
                        source,
                    });
                }
            }
        }

        debug!(workers = config.workers, "worker group started");
        Ok(Self { inner })
    }

    /// Returns the number of workers in the group.
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.workers.len()
    }

    /// Returns the identities of all members.
    ///
    /// Membership is fixed at construction; this is the snapshot sticky
    /// strategies key their context maps by.
    #[must_use]
    pub fn members(&self) -> Vec<WorkerId> {
        self.inner.workers.iter().map(|w| w.id).collect()
    }

    /// Returns an executor scheduling onto the group as a whole.
    #[must_use]
    pub fn executor(&self) -> Arc<dyn Executor> {
        Arc::new(GroupExecutor {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Returns an executor scheduling onto one specific member, or `None`
    /// if the identifier does not name a member of this group.
    #[must_use]
    pub fn member_executor(&self, id: WorkerId) -> Option<Arc<dyn Executor>> {
        self.inner
            .workers
            .iter()
            .find(|w| w.id == id)
            .map(|shared| {
                Arc::new(MemberExecutor {
                    shared: Arc::clone(shared),
                }) as Arc<dyn Executor>
            })
    }

    /// Stops all workers and joins their threads.
    ///
    /// Idempotent. Work still queued when shutdown lands is dropped; the
    /// affected tasks report `Interrupted`. Executor handles obtained before
    /// shutdown remain valid — scheduling through them after shutdown drops
    /// the runnable the same way.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

impl Drop for WorkerGroup {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl fmt::Debug for WorkerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerGroup")
            .field("workers", &self.size())
            .field("shutdown", &self.inner.shutdown.load(Ordering::Relaxed))
            .finish()
    }
}

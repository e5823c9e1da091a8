//! Execbridge: connection-affine execution core for asynchronous servers.
//!
//! # Overview
//!
//! Execbridge is the execution core of an asynchronous network-server
//! library: a runtime bridge that runs application-supplied asynchronous
//! computations ("programs") on behalf of inbound connections, guaranteeing
//! worker affinity consistent with the connection's owning I/O worker and
//! race-safe interruption of the program when the connection closes. Coupled
//! to it is a four-variant outcome algebra request-handling pipelines use to
//! compose independent handler layers.
//!
//! # Core Guarantees
//!
//! - **Sticky affinity**: a connection's program executes on its owning
//!   worker's context; unknown workers fall back to the base context
//! - **Interruption on close**: connection close requests task interruption;
//!   requests against terminated tasks are no-ops
//! - **Exactly-once terminal states**: a task completes, fails, or is
//!   interrupted exactly once; no silent drops — even tasks torn down with
//!   their queue report an outcome
//! - **Lawful composition**: the outcome algebra's fallback operator is
//!   associative and left-biased, so routing and middleware layers chain
//!   predictably
//!
//! # Module Structure
//!
//! - [`types`]: Core types (identifiers, cancellation reasons, defects)
//! - [`outcome`]: The four-variant handler outcome algebra
//! - [`runtime`]: Execution contexts, tasks, cancellation, worker groups
//! - [`server`]: Connection surface, execution strategies, the runtime bridge
//! - [`test_utils`]: Shared test helpers (logging, runners, stubs)
//!
//! # Quick Start
//!
//! ```ignore
//! use execbridge::runtime::{ExecutionContext, GroupConfig, WorkerGroup};
//! use execbridge::server::RuntimeBridge;
//!
//! let group = WorkerGroup::with_config(GroupConfig::default())?;
//! let base = ExecutionContext::inline();
//! let bridge = RuntimeBridge::sticky(&base, &group);
//!
//! // per accepted connection:
//! bridge.run(&connection, async move {
//!     // handle the connection
//!     Ok::<(), HandlerError>(())
//! });
//! ```
//!
//! The transport/event-loop layer, TLS and protocol negotiation, routing
//! construction, and process configuration are external collaborators; this
//! crate only bridges their connections onto executors and gives their
//! handler stacks an outcome algebra.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod outcome;
pub mod runtime;
pub mod server;
pub mod test_utils;
pub mod types;

pub use outcome::{Cause, Outcome};
pub use runtime::{
    current_worker, yield_now, BuildError, CancelToken, ExecutionContext, Executor, GroupConfig,
    InlineExecutor, TaskHandle, TaskOutcome, TaskState, WorkerGroup,
};
pub use server::{CloseSignal, Connection, ExecutionStrategy, RuntimeBridge};
pub use types::{CancelKind, CancelReason, DefectPayload, TaskId, WorkerId};

//! Connection-facing surface: strategies and the runtime bridge.
//!
//! This module provides the pieces a transport layer composes per process:
//!
//! - [`Connection`] — the per-connection interface this core consumes
//! - [`CloseSignal`] — one-shot close notification backing `on_close`
//! - [`ExecutionStrategy`] — policy selecting the context for a connection
//! - [`RuntimeBridge`] — the run operation wiring cancellation-on-close
//!
//! # Architecture
//!
//! ```text
//! Transport (accept loop)
//! │
//! ├── builds: base ExecutionContext + WorkerGroup
//! ├── builds: ExecutionStrategy (default | dedicated | sticky)
//! └── per accepted connection:
//!     RuntimeBridge::run(connection, program)
//!     ├── strategy.context_for(connection)
//!     ├── spawn program as interruptible task
//!     ├── program's first step: connection.on_close(cancel)
//!     └── terminal outcome → {nothing | close | log defect + close}
//! ```

pub mod bridge;
pub mod connection;
pub mod strategy;

pub use bridge::RuntimeBridge;
pub use connection::{CloseSignal, Connection};
pub use strategy::ExecutionStrategy;

//! Cancellation reason and kind types.
//!
//! Interruption in execbridge is an explicit request, not a silent drop.
//! This module defines the types that describe why an interruption was
//! requested; the request itself travels through a
//! [`CancelToken`](crate::runtime::CancelToken).

use core::fmt;

/// The kind of interruption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CancelKind {
    /// The connection owning the program closed.
    ConnectionClosed,
    /// Explicit cancellation requested by user code.
    User,
    /// The executor running the program shut down.
    Shutdown,
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionClosed => write!(f, "connection closed"),
            Self::User => write!(f, "user"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// The reason for an interruption, including kind and optional context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    /// The kind of interruption.
    pub kind: CancelKind,
    /// Optional human-readable message (static for determinism).
    pub message: Option<&'static str>,
}

impl CancelReason {
    /// Creates a new cancellation reason with the given kind.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a connection-closed cancellation reason.
    #[must_use]
    pub const fn connection_closed() -> Self {
        Self::new(CancelKind::ConnectionClosed)
    }

    /// Creates a user cancellation reason with a message.
    #[must_use]
    pub const fn user(message: &'static str) -> Self {
        Self {
            kind: CancelKind::User,
            message: Some(message),
        }
    }

    /// Creates a shutdown cancellation reason.
    #[must_use]
    pub const fn shutdown() -> Self {
        Self::new(CancelKind::Shutdown)
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message {
            Some(message) => write!(f, "{} ({message})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

//! The connection surface this core consumes.
//!
//! Connections are owned by the transport layer; this core only reads their
//! close notification and worker identity, and only ever closes one as an
//! explicit failure response. [`CloseSignal`] is a one-shot notification
//! transports (and tests) can use to back [`Connection::on_close`].

use crate::types::WorkerId;
use core::fmt;
use std::sync::{Arc, Mutex};

/// One inbound network connection, as seen by the execution core.
///
/// Created by the transport layer on accept and destroyed on close. The
/// runtime bridge subscribes to the close notification exactly once per run
/// invocation and uses the worker identity for sticky context selection.
pub trait Connection: Send + Sync {
    /// Subscribes a listener to the connection's close notification.
    ///
    /// The listener is invoked at most once, when the connection closes. A
    /// listener registered after the connection already closed must be
    /// invoked immediately.
    fn on_close(&self, listener: Box<dyn FnOnce() + Send>);

    /// Returns the identity of the worker currently servicing the
    /// connection.
    fn current_worker(&self) -> WorkerId;

    /// Closes the connection.
    ///
    /// Called by the bridge as its failure response; must be safe to call
    /// more than once.
    fn close(&self);
}

enum ListenerState {
    Open(Vec<Box<dyn FnOnce() + Send>>),
    Closed,
}

impl fmt::Debug for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(listeners) => f
                .debug_tuple("Open")
                .field(&format_args!("{} listener(s)", listeners.len()))
                .finish(),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// A one-shot close notification.
///
/// Listeners registered while the signal is open are stored and run — in
/// registration order — when [`CloseSignal::fire`] is called. Firing is
/// idempotent; listeners registered after the fact run immediately on the
/// registering thread.
///
/// # Example
///
/// ```ignore
/// use execbridge::server::CloseSignal;
///
/// let signal = CloseSignal::new();
/// signal.on_close(Box::new(|| println!("closed")));
/// signal.fire();          // runs the listener
/// signal.fire();          // no-op
/// ```
#[derive(Clone)]
pub struct CloseSignal {
    state: Arc<Mutex<ListenerState>>,
}

impl CloseSignal {
    /// Creates a new, open close signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ListenerState::Open(Vec::new()))),
        }
    }

    /// Registers a listener.
    ///
    /// Runs the listener immediately if the signal already fired.
    pub fn on_close(&self, listener: Box<dyn FnOnce() + Send>) {
        {
            let mut state = self.state.lock().expect("close signal lock poisoned");
            match &mut *state {
                ListenerState::Open(listeners) => {
                    listeners.push(listener);
                    return;
                }
                ListenerState::Closed => {}
            }
        }
        // Already closed: deliver outside the lock.
        listener();
    }

    /// Fires the signal, running all registered listeners.
    ///
    /// Idempotent: only the first call runs listeners.
    pub fn fire(&self) {
        let listeners = {
            let mut state = self.state.lock().expect("close signal lock poisoned");
            match std::mem::replace(&mut *state, ListenerState::Closed) {
                ListenerState::Open(listeners) => listeners,
                ListenerState::Closed => return,
            }
        };
        for listener in listeners {
            listener();
        }
    }

    /// Returns true if the signal has fired.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(
            *self.state.lock().expect("close signal lock poisoned"),
            ListenerState::Closed
        )
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CloseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseSignal")
            .field("state", &*self.state.lock().expect("close signal lock poisoned"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn listeners_run_on_fire() {
        let signal = CloseSignal::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            signal.on_close(Box::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        signal.fire();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn fire_is_idempotent() {
        let signal = CloseSignal::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&hits);
        signal.on_close(Box::new(move || {
            probe.fetch_add(1, Ordering::SeqCst);
        }));
        signal.fire();
        signal.fire();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_listener_runs_immediately() {
        let signal = CloseSignal::new();
        signal.fire();

        let hits = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&hits);
        signal.on_close(Box::new(move || {
            probe.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn is_closed_tracks_fire() {
        let signal = CloseSignal::new();
        assert!(!signal.is_closed());
        signal.fire();
        assert!(signal.is_closed());
    }
}

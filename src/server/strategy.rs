//! Execution strategies: which context runs a connection's program.
//!
//! A strategy is a policy built once — capturing a base execution context
//! and, for the rebinding variants, a worker group — and consulted on every
//! accepted connection. Consulting a strategy is deterministic and free of
//! side effects; all construction-time work (deriving rebound contexts,
//! snapshotting group membership) happens exactly once.
//!
//! Pinning a connection's program to the worker that owns the connection's
//! I/O state avoids migrating continuations across threads and lets the
//! surrounding I/O layer assume single-threaded access to per-connection
//! mutable state.

use crate::runtime::{ExecutionContext, WorkerGroup};
use crate::server::connection::Connection;
use crate::types::WorkerId;
use core::fmt;
use std::collections::HashMap;

enum Kind {
    /// Always the captured base context, independent of the connection.
    Default(ExecutionContext),
    /// One derived context rebound onto a worker group, shared by all
    /// connections.
    Dedicated(ExecutionContext),
    /// One derived context per group member, keyed by worker identity, with
    /// the unrebounded base as fallback.
    Sticky {
        base: ExecutionContext,
        contexts: HashMap<WorkerId, ExecutionContext>,
    },
}

/// Policy selecting the execution context that must run a given connection's
/// program.
pub struct ExecutionStrategy {
    kind: Kind,
}

impl ExecutionStrategy {
    /// Builds the default strategy: every connection runs on `base`.
    #[must_use]
    pub const fn default_strategy(base: ExecutionContext) -> Self {
        Self {
            kind: Kind::Default(base),
        }
    }

    /// Builds a dedicated strategy: every connection runs on one context
    /// derived from `base` and rebound onto `group` as a whole.
    #[must_use]
    pub fn dedicated(base: &ExecutionContext, group: &WorkerGroup) -> Self {
        Self {
            kind: Kind::Dedicated(base.on_executor(group.executor())),
        }
    }

    /// Builds a sticky strategy over `group`.
    ///
    /// For every current member, one context is derived from `base` and
    /// rebound onto exactly that member. The worker→context map is a
    /// snapshot taken here and never mutated: workers added to the group
    /// afterwards are not represented and always resolve to the unrebounded
    /// base context. This is a documented limitation of the snapshot design,
    /// not a bug.
    #[must_use]
    pub fn sticky(base: &ExecutionContext, group: &WorkerGroup) -> Self {
        let mut contexts = HashMap::new();
        for id in group.members() {
            if let Some(executor) = group.member_executor(id) {
                contexts.insert(id, base.on_executor(executor));
            }
        }
        Self {
            kind: Kind::Sticky {
                base: base.clone(),
                contexts,
            },
        }
    }

    /// Returns the context that must run `connection`'s program.
    ///
    /// Deterministic and side-effect-free: the same connection state always
    /// resolves to the same context.
    pub fn context_for<C: Connection + ?Sized>(&self, connection: &C) -> &ExecutionContext {
        match &self.kind {
            Kind::Default(context) | Kind::Dedicated(context) => context,
            Kind::Sticky { base, contexts } => contexts
                .get(&connection.current_worker())
                .unwrap_or(base),
        }
    }

    /// Returns the number of worker-pinned contexts held by this strategy.
    ///
    /// Zero for the non-sticky variants.
    #[must_use]
    pub fn pinned_contexts(&self) -> usize {
        match &self.kind {
            Kind::Default(_) | Kind::Dedicated(_) => 0,
            Kind::Sticky { contexts, .. } => contexts.len(),
        }
    }
}

impl fmt::Debug for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Default(_) => f.debug_struct("ExecutionStrategy::Default").finish(),
            Kind::Dedicated(_) => f.debug_struct("ExecutionStrategy::Dedicated").finish(),
            Kind::Sticky { contexts, .. } => f
                .debug_struct("ExecutionStrategy::Sticky")
                .field("workers", &contexts.len())
                .finish(),
        }
    }
}

//! Four-variant handler outcome algebra.
//!
//! [`Outcome`] represents what happened when a handler ran:
//!
//! - `Empty`: no result — the handler declines to act, signalling fallthrough
//! - `Success(v)`: a produced value
//! - `Failure(cause)`: an error value, expected or defect
//! - `Effect(..)`: a suspended computation producing another outcome
//!
//! Empty is not an error: it lets a routing layer try the next candidate via
//! [`Outcome::or`] without treating non-match as failure. Failure always
//! short-circuits [`Outcome::or`]; recovery goes through [`Outcome::or_else`]
//! first.
//!
//! Combinator naming follows std `Option`/`Result`: [`Outcome::and`] and
//! [`Outcome::and_then`] sequence through success, [`Outcome::or`] and
//! [`Outcome::or_else`] recover from emptiness and failure respectively.
//! The variant set is closed; the algebra's laws depend on exhaustive
//! matching over exactly these four.
//!
//! Values are immutable and transient: produced by one handling step and
//! consumed by the next, never retained as long-lived state.

pub mod cause;

pub use cause::Cause;

use crate::types::DefectPayload;
use core::fmt;
use std::future::Future;
use std::pin::Pin;

/// A suspended computation producing an [`Outcome`].
///
/// Constructed through [`Outcome::effect`]; resolved through
/// [`Outcome::resolve`].
pub struct EffectFuture<T, E> {
    future: Pin<Box<dyn Future<Output = Outcome<T, E>> + Send>>,
}

impl<T, E> EffectFuture<T, E> {
    fn new<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        Self {
            future: Box::pin(future),
        }
    }

    /// Awaits one layer of suspension.
    async fn advance(self) -> Outcome<T, E> {
        self.future.await
    }
}

impl<T, E> fmt::Debug for EffectFuture<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectFuture").finish_non_exhaustive()
    }
}

/// The result of one handling step.
///
/// See the [module docs](self) for variant semantics and laws.
#[derive(Debug)]
pub enum Outcome<T, E> {
    /// No result; identity element for [`Outcome::or`].
    Empty,
    /// A produced value.
    Success(T),
    /// A failure, expected or defect.
    Failure(Cause<E>),
    /// A suspended computation that yields another outcome when resolved.
    Effect(EffectFuture<T, E>),
}

impl<T, E> Outcome<T, E> {
    /// Creates a successful outcome.
    #[must_use]
    pub const fn succeed(value: T) -> Self {
        Self::Success(value)
    }

    /// Creates an expected-failure outcome.
    #[must_use]
    pub const fn fail(error: E) -> Self {
        Self::Failure(Cause::Fail(error))
    }

    /// Creates a defect outcome.
    #[must_use]
    pub const fn die(defect: DefectPayload) -> Self {
        Self::Failure(Cause::Die(defect))
    }

    /// Creates a failure outcome from an existing cause.
    #[must_use]
    pub const fn from_cause(cause: Cause<E>) -> Self {
        Self::Failure(cause)
    }

    /// Creates a suspended outcome from a future.
    ///
    /// The computation runs only when the outcome is [resolved](Self::resolve)
    /// or reached through a deferring combinator chain.
    pub fn effect<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<T, E>> + Send + 'static,
    {
        Self::Effect(EffectFuture::new(future))
    }

    /// Returns true if this outcome is `Empty`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns true if this outcome is `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if this outcome is `Failure`.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns true if this outcome is a suspended computation.
    #[must_use]
    pub const fn is_effect(&self) -> bool {
        matches!(self, Self::Effect(_))
    }

    /// Left-biased fallback (`defaultWith`).
    ///
    /// `Empty` yields `other`; any non-Empty outcome — Success, Failure, or
    /// Effect — yields itself, and `other` is never evaluated or observed.
    /// A suspended computation counts as committed even before it resolves:
    /// an effect that later resolves to `Empty` does not retroactively fall
    /// back to `other`. Chains of `or` are associative; the first non-Empty
    /// outcome, scanning left to right, wins.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Empty => other,
            committed => committed,
        }
    }
}

impl<T, E> Outcome<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Sequencing (`*>`): runs `self` for effect, discards its success value.
    ///
    /// `Success` proceeds to `next`; `Empty` and `Failure` short-circuit the
    /// chain unchanged; a suspended computation defers the decision until it
    /// resolves.
    #[must_use]
    pub fn and<U>(self, next: Outcome<U, E>) -> Outcome<U, E>
    where
        U: Send + 'static,
    {
        match self {
            Self::Empty => Outcome::Empty,
            Self::Success(_) => next,
            Self::Failure(cause) => Outcome::Failure(cause),
            Self::Effect(effect) => Outcome::effect(async move { effect.advance().await.and(next) }),
        }
    }

    /// Transforms only a success value (`flatMap`).
    ///
    /// `Empty` and `Failure` pass through unchanged; a suspended computation
    /// defers application until it resolves.
    #[must_use]
    pub fn and_then<U, F>(self, f: F) -> Outcome<U, E>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Outcome<U, E> + Send + 'static,
    {
        match self {
            Self::Empty => Outcome::Empty,
            Self::Success(value) => f(value),
            Self::Failure(cause) => Outcome::Failure(cause),
            Self::Effect(effect) => {
                Outcome::effect(async move { effect.advance().await.and_then(f) })
            }
        }
    }

    /// Transforms only an expected failure (`flatMapError`).
    ///
    /// `Empty` and `Success` pass through unchanged, defects are not
    /// recoverable and pass through as well; a suspended computation defers
    /// application until it resolves. On a chain, the last `or_else` applied
    /// determines the final cause.
    #[must_use]
    pub fn or_else<E2, F>(self, f: F) -> Outcome<T, E2>
    where
        E2: Send + 'static,
        F: FnOnce(E) -> Outcome<T, E2> + Send + 'static,
    {
        match self {
            Self::Empty => Outcome::Empty,
            Self::Success(value) => Outcome::Success(value),
            Self::Failure(Cause::Fail(error)) => f(error),
            Self::Failure(Cause::Die(defect)) => Outcome::Failure(Cause::Die(defect)),
            Self::Effect(effect) => {
                Outcome::effect(async move { effect.advance().await.or_else(f) })
            }
        }
    }

    /// Maps a success value, keeping the outcome shape.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Outcome<U, E>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            Self::Empty => Outcome::Empty,
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(cause) => Outcome::Failure(cause),
            Self::Effect(effect) => Outcome::effect(async move { effect.advance().await.map(f) }),
        }
    }

    /// Maps an expected error value; defects pass through unchanged.
    #[must_use]
    pub fn map_error<E2, F>(self, f: F) -> Outcome<T, E2>
    where
        E2: Send + 'static,
        F: FnOnce(E) -> E2 + Send + 'static,
    {
        match self {
            Self::Empty => Outcome::Empty,
            Self::Success(value) => Outcome::Success(value),
            Self::Failure(cause) => Outcome::Failure(cause.map_fail(f)),
            Self::Effect(effect) => {
                Outcome::effect(async move { effect.advance().await.map_error(f) })
            }
        }
    }

    /// Drives suspended layers until a non-Effect outcome remains.
    pub async fn resolve(self) -> Self {
        let mut outcome = self;
        loop {
            match outcome {
                Self::Effect(effect) => outcome = effect.advance().await,
                settled => return settled,
            }
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::fail(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::block_on;

    fn fail_value(outcome: &Outcome<i32, i32>) -> Option<i32> {
        match outcome {
            Outcome::Failure(Cause::Fail(e)) => Some(*e),
            _ => None,
        }
    }

    // =========================================================================
    // Fallback (`or`)
    // =========================================================================

    #[test]
    fn empty_or_takes_right() {
        let out: Outcome<i32, i32> = Outcome::Empty.or(Outcome::succeed(1));
        assert!(matches!(out, Outcome::Success(1)));
    }

    #[test]
    fn success_or_keeps_left() {
        let out: Outcome<i32, i32> = Outcome::succeed(1).or(Outcome::succeed(2));
        assert!(matches!(out, Outcome::Success(1)));
    }

    #[test]
    fn failure_or_keeps_left() {
        let out: Outcome<i32, i32> = Outcome::fail(1).or(Outcome::succeed(2));
        assert_eq!(fail_value(&out), Some(1));
    }

    #[test]
    fn effect_or_keeps_left_unevaluated() {
        let effect: Outcome<i32, i32> = Outcome::effect(async { Outcome::succeed(1) });
        let out = effect.or(Outcome::succeed(2));
        assert!(out.is_effect());
        let settled = block_on(out.resolve());
        assert!(matches!(settled, Outcome::Success(1)));
    }

    #[test]
    fn or_chain_first_non_empty_wins() {
        let out: Outcome<i32, i32> = Outcome::Empty
            .or(Outcome::Empty)
            .or(Outcome::succeed(3))
            .or(Outcome::succeed(4));
        assert!(matches!(out, Outcome::Success(3)));
    }

    // =========================================================================
    // Sequencing (`and`)
    // =========================================================================

    #[test]
    fn success_and_proceeds() {
        let out: Outcome<i32, i32> = Outcome::succeed(0).and(Outcome::fail(1));
        assert_eq!(fail_value(&out), Some(1));
    }

    #[test]
    fn first_failure_wins_unrecovered() {
        let out: Outcome<i32, i32> = Outcome::succeed(0)
            .and(Outcome::<i32, i32>::fail(1))
            .and(Outcome::fail(2));
        assert_eq!(fail_value(&out), Some(1));
    }

    #[test]
    fn empty_and_stays_empty() {
        let out: Outcome<i32, i32> = Outcome::<i32, i32>::Empty.and(Outcome::succeed(1));
        assert!(out.is_empty());
    }

    // =========================================================================
    // flatMap / flatMapError
    // =========================================================================

    #[test]
    fn and_then_transforms_success_only() {
        let out: Outcome<i32, i32> = Outcome::succeed(20).and_then(|v| Outcome::succeed(v + 1));
        assert!(matches!(out, Outcome::Success(21)));

        let empty: Outcome<i32, i32> = Outcome::Empty.and_then(|v: i32| Outcome::succeed(v + 1));
        assert!(empty.is_empty());

        let failed: Outcome<i32, i32> = Outcome::fail(9).and_then(|v: i32| Outcome::succeed(v + 1));
        assert_eq!(fail_value(&failed), Some(9));
    }

    #[test]
    fn or_else_transforms_failure_only() {
        let recovered: Outcome<i32, i32> = Outcome::fail(1).or_else(|_| Outcome::fail(2));
        assert_eq!(fail_value(&recovered), Some(2));

        let success: Outcome<i32, i32> = Outcome::succeed(5).or_else(|_: i32| Outcome::fail(2));
        assert!(matches!(success, Outcome::Success(5)));

        let empty: Outcome<i32, i32> = Outcome::Empty.or_else(|_: i32| Outcome::fail(2));
        assert!(empty.is_empty());
    }

    #[test]
    fn or_else_does_not_recover_defects() {
        let out: Outcome<i32, i32> =
            Outcome::die(DefectPayload::new("boom")).or_else(|_: i32| Outcome::fail(2));
        assert!(matches!(out, Outcome::Failure(Cause::Die(_))));
    }

    #[test]
    fn sequenced_failure_then_recovery() {
        // (Success(0) *> Failure(1)).flatMapError(_ => Failure(2)) == Failure(2)
        let out: Outcome<i32, i32> = Outcome::succeed(0)
            .and(Outcome::fail(1))
            .or_else(|_| Outcome::fail(2));
        assert_eq!(fail_value(&out), Some(2));
    }

    // =========================================================================
    // Effects and resolution
    // =========================================================================

    #[test]
    fn effect_defers_and_then() {
        let out: Outcome<i32, i32> = Outcome::effect(async { Outcome::succeed(1) })
            .and_then(|v| Outcome::succeed(v + 1));
        assert!(out.is_effect());
        let settled = block_on(out.resolve());
        assert!(matches!(settled, Outcome::Success(2)));
    }

    #[test]
    fn effect_defers_sequencing() {
        let out: Outcome<i32, i32> =
            Outcome::effect(async { Outcome::succeed(0) }).and(Outcome::fail(7));
        let settled = block_on(out.resolve());
        assert_eq!(fail_value(&settled), Some(7));
    }

    #[test]
    fn resolve_unwraps_nested_effects() {
        let nested: Outcome<i32, i32> =
            Outcome::effect(async { Outcome::effect(async { Outcome::succeed(3) }) });
        let settled = block_on(nested.resolve());
        assert!(matches!(settled, Outcome::Success(3)));
    }

    #[test]
    fn resolve_is_identity_on_settled_outcomes() {
        let settled = block_on(Outcome::<i32, i32>::succeed(4).resolve());
        assert!(matches!(settled, Outcome::Success(4)));
    }

    // =========================================================================
    // Conversions and conveniences
    // =========================================================================

    #[test]
    fn from_result() {
        let ok: Outcome<i32, i32> = Ok(1).into();
        assert!(matches!(ok, Outcome::Success(1)));

        let err: Outcome<i32, i32> = Err(2).into();
        assert_eq!(fail_value(&err), Some(2));
    }

    #[test]
    fn map_and_map_error() {
        let mapped: Outcome<i32, i32> = Outcome::succeed(10).map(|v| v * 2);
        assert!(matches!(mapped, Outcome::Success(20)));

        let mapped: Outcome<i32, i32> = Outcome::fail(10).map_error(|e| e + 1);
        assert_eq!(fail_value(&mapped), Some(11));
    }
}

//! Failure causes: expected errors versus defects.
//!
//! Every [`Outcome::Failure`](super::Outcome::Failure) carries a [`Cause`]
//! describing what kind of failure occurred. Combinators treat both kinds
//! uniformly; the runtime bridge is the sole consumer of the distinction,
//! via [`Cause::defect`], when it decides whether to emit diagnostics.

use crate::types::DefectPayload;
use core::fmt;

/// The cause of a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause<E> {
    /// An expected error value produced intentionally by application logic.
    Fail(E),
    /// An unexpected failure: a panic escaping user code, or a condition
    /// explicitly declared unrecoverable.
    Die(DefectPayload),
}

impl<E> Cause<E> {
    /// Creates an expected-failure cause.
    #[must_use]
    pub const fn fail(error: E) -> Self {
        Self::Fail(error)
    }

    /// Creates a defect cause.
    #[must_use]
    pub const fn die(defect: DefectPayload) -> Self {
        Self::Die(defect)
    }

    /// Returns the defect carried by this cause, if any.
    #[must_use]
    pub const fn defect(&self) -> Option<&DefectPayload> {
        match self {
            Self::Fail(_) => None,
            Self::Die(defect) => Some(defect),
        }
    }

    /// Returns true if this cause carries a defect.
    #[must_use]
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::Die(_))
    }

    /// Returns true if this cause is an expected failure.
    #[must_use]
    pub const fn is_fail(&self) -> bool {
        matches!(self, Self::Fail(_))
    }

    /// Returns the expected error value, if any.
    #[must_use]
    pub const fn fail_value(&self) -> Option<&E> {
        match self {
            Self::Fail(error) => Some(error),
            Self::Die(_) => None,
        }
    }

    /// Maps the expected error value; defects pass through unchanged.
    pub fn map_fail<E2, F: FnOnce(E) -> E2>(self, f: F) -> Cause<E2> {
        match self {
            Self::Fail(error) => Cause::Fail(f(error)),
            Self::Die(defect) => Cause::Die(defect),
        }
    }
}

impl<E: fmt::Display> fmt::Display for Cause<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail(error) => write!(f, "{error}"),
            Self::Die(defect) => write!(f, "{defect}"),
        }
    }
}

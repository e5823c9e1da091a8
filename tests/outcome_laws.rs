//! Algebraic law property tests for the outcome algebra.
//!
//! # Laws Tested
//!
//! ## Fallback (`or`)
//! - Empty is the left identity
//! - any non-Empty left side wins and the right side is never observed
//! - associativity
//!
//! ## Sequencing and transforms
//! - `and` short-circuits on Empty and Failure, proceeds on Success
//! - `and_then` transforms only Success
//! - `or_else` transforms only expected failures; defects pass through
//! - the last error transform on a chain determines the final cause
//!
//! Every law also runs on effect-wrapped values: outcomes are built from
//! cloneable specifications, wrapped in up to three suspension layers, and
//! compared after resolution.

use execbridge::outcome::{Cause, Outcome};
use execbridge::test_utils::block_on;
use execbridge::types::DefectPayload;
use proptest::prelude::*;

/// Buildable description of an outcome; cloneable so one law can
/// materialize the same value several times.
#[derive(Debug, Clone)]
enum Recipe {
    Empty,
    Success(i32),
    Fail(i32),
    Die(String),
    Effect(Box<Recipe>),
}

impl Recipe {
    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

fn build(recipe: Recipe) -> Outcome<i32, i32> {
    match recipe {
        Recipe::Empty => Outcome::Empty,
        Recipe::Success(v) => Outcome::succeed(v),
        Recipe::Fail(e) => Outcome::fail(e),
        Recipe::Die(message) => Outcome::die(DefectPayload::new(message)),
        Recipe::Effect(inner) => Outcome::effect(async move { build(*inner) }),
    }
}

/// The shape of a settled outcome, comparable across materializations.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Settled {
    Empty,
    Success(i32),
    Fail(i32),
    Die(String),
}

fn settle(outcome: Outcome<i32, i32>) -> Settled {
    match block_on(outcome.resolve()) {
        Outcome::Empty => Settled::Empty,
        Outcome::Success(v) => Settled::Success(v),
        Outcome::Failure(Cause::Fail(e)) => Settled::Fail(e),
        Outcome::Failure(Cause::Die(defect)) => Settled::Die(defect.message().to_string()),
        Outcome::Effect(_) => unreachable!("resolve returned a suspended outcome"),
    }
}

fn arb_recipe() -> impl Strategy<Value = Recipe> {
    let leaf = prop_oneof![
        Just(Recipe::Empty),
        any::<i32>().prop_map(Recipe::Success),
        any::<i32>().prop_map(Recipe::Fail),
        "[a-z]{1,8}".prop_map(Recipe::Die),
    ];
    leaf.prop_recursive(3, 8, 1, |inner| {
        inner.prop_map(|recipe| Recipe::Effect(Box::new(recipe)))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// LAW: `Empty.or(b) == b`.
    #[test]
    fn or_left_identity(b in arb_recipe()) {
        let direct = settle(build(b.clone()));
        let chained = settle(Outcome::Empty.or(build(b)));
        prop_assert_eq!(chained, direct);
    }

    /// LAW: for non-Empty `a`, `a.or(b) == a` — including suspended `a`,
    /// which counts as committed before it resolves.
    #[test]
    fn or_left_bias(a in arb_recipe(), b in arb_recipe()) {
        prop_assume!(!a.is_empty());
        let alone = settle(build(a.clone()));
        let chained = settle(build(a).or(build(b)));
        prop_assert_eq!(chained, alone);
    }

    /// LAW: `(a.or(b)).or(c) == a.or(b.or(c))`.
    #[test]
    fn or_associative(a in arb_recipe(), b in arb_recipe(), c in arb_recipe()) {
        let left = settle(build(a.clone()).or(build(b.clone())).or(build(c.clone())));
        let right = settle(build(a).or(build(b).or(build(c))));
        prop_assert_eq!(left, right);
    }

    /// LAW: `and_then` transforms only Success; Empty and Failure pass
    /// through, suspension defers.
    #[test]
    fn and_then_success_only(a in arb_recipe()) {
        let expected = match settle(build(a.clone())) {
            Settled::Success(v) => Settled::Success(v.wrapping_add(1)),
            other => other,
        };
        let transformed = build(a).and_then(|v| Outcome::succeed(v.wrapping_add(1)));
        prop_assert_eq!(settle(transformed), expected);
    }

    /// LAW: `or_else` transforms only expected failures; Empty, Success and
    /// defects pass through.
    #[test]
    fn or_else_fail_only(a in arb_recipe()) {
        let expected = match settle(build(a.clone())) {
            Settled::Fail(e) => Settled::Fail(e.wrapping_mul(2)),
            other => other,
        };
        let recovered = build(a).or_else(|e| Outcome::fail(e.wrapping_mul(2)));
        prop_assert_eq!(settle(recovered), expected);
    }

    /// LAW: the last error transform on a chain determines the final cause.
    #[test]
    fn last_or_else_wins(a in arb_recipe()) {
        let expected = match settle(build(a.clone())) {
            Settled::Fail(_) => Settled::Fail(200),
            other => other,
        };
        let chained = build(a)
            .or_else(|_| Outcome::fail(100))
            .or_else(|_| Outcome::fail(200));
        prop_assert_eq!(settle(chained), expected);
    }

    /// LAW: `a.and(b)` stays Empty for Empty `a`, keeps the first failure,
    /// and proceeds to `b` only through Success.
    #[test]
    fn and_short_circuits(a in arb_recipe(), b in arb_recipe()) {
        let expected = match settle(build(a.clone())) {
            Settled::Empty => Settled::Empty,
            Settled::Success(_) => settle(build(b.clone())),
            failure => failure,
        };
        prop_assert_eq!(settle(build(a).and(build(b))), expected);
    }
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn empty_falls_through_to_success() {
    let out: Outcome<i32, i32> = Outcome::Empty.or(Outcome::succeed(1));
    execbridge::assert_outcome_success!(out, 1);
}

#[test]
fn first_success_wins() {
    let out: Outcome<i32, i32> = Outcome::succeed(1).or(Outcome::succeed(2));
    execbridge::assert_outcome_success!(out, 1);
}

#[test]
fn recovered_sequence_reports_final_error() {
    // (Success(0) *> Failure(1)) recovered to Failure(2)
    let out: Outcome<i32, i32> = Outcome::succeed(0)
        .and(Outcome::fail(1))
        .or_else(|_| Outcome::fail(2));
    execbridge::assert_outcome_fail!(out, 2);
}

#[test]
fn unrecovered_sequence_reports_first_error() {
    // Success(0) *> Failure(1) *> Failure(2), no recovery
    let out: Outcome<i32, i32> = Outcome::succeed(0)
        .and(Outcome::<i32, i32>::fail(1))
        .and(Outcome::fail(2));
    execbridge::assert_outcome_fail!(out, 1);
}

#[test]
fn sequencing_through_empty_stays_empty() {
    let out: Outcome<i32, i32> = Outcome::<i32, i32>::Empty
        .and(Outcome::succeed(1))
        .and(Outcome::fail(2));
    execbridge::assert_outcome_empty!(out);
}

#[test]
fn suspended_routing_chain_settles_like_direct_one() {
    let suspended: Outcome<i32, i32> = Outcome::effect(async { Outcome::Empty })
        .and_then(|v: i32| Outcome::succeed(v + 1))
        .or(Outcome::succeed(10));
    // The suspended head commits the chain: fallback never applies, and the
    // resolved Empty propagates through and_then.
    let settled = block_on(suspended.resolve());
    execbridge::assert_outcome_empty!(settled);

    let direct: Outcome<i32, i32> = Outcome::Empty
        .and_then(|v: i32| Outcome::succeed(v + 1))
        .or(Outcome::succeed(10));
    execbridge::assert_outcome_success!(direct, 10);
}

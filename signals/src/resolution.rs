use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;

/// Decides when a dispatch counts as resolved. Consulted after every listener completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Every live listener has reported and none of them failed
    #[default]
    All,
    /// At least one listener succeeded
    Any,
    /// At least one listener failed
    AnyFail,
    /// Every live listener has reported and none of them succeeded
    None,
}

/// How one outcome is classified for resolution purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure,
    /// The listener returned nothing. Ignored by `any` and `any-fail`, passes `all`, fails `none`.
    Neutral,
}

/// Where the dispatch loop stands when resolution is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionState {
    /// Bindings from this dispatch's snapshot that are still live and have not reported yet
    pub pending: usize,
    /// The loop was stopped before every listener could report
    pub stopped: bool,
}

/// Classifies returned values as success or failure. The default treats every returned value as a success.
pub struct SuccessTest<R>(Arc<dyn Fn(&R) -> bool + Send + Sync>);

impl<R> SuccessTest<R> {
    pub fn new<F>(test: F) -> Self
    where F: Fn(&R) -> bool + Send + Sync + 'static {
        Self(Arc::new(test))
    }

    pub fn test(&self, value: &R) -> bool { (self.0)(value) }

    pub fn classify(&self, outcome: &Outcome<R>) -> Verdict {
        match outcome {
            Outcome::Value(value) if self.test(value) => Verdict::Success,
            Outcome::Value(_) | Outcome::Failed(_) => Verdict::Failure,
            Outcome::Empty => Verdict::Neutral,
        }
    }
}

impl<R> Default for SuccessTest<R> {
    fn default() -> Self { Self(Arc::new(|_| true)) }
}

impl<R> Clone for SuccessTest<R> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<R> std::fmt::Debug for SuccessTest<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "SuccessTest({:p})", Arc::as_ptr(&self.0)) }
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::All => "all",
            Resolution::Any => "any",
            Resolution::AnyFail => "any-fail",
            Resolution::None => "none",
        }
    }

    /// Evaluate this strategy against the outcomes accumulated so far
    pub fn is_resolved<R>(&self, outcomes: &[Outcome<R>], test: &SuccessTest<R>, state: ResolutionState) -> bool {
        let covered = state.stopped || state.pending == 0;
        let mut verdicts = outcomes.iter().map(|outcome| test.classify(outcome));
        match self {
            Resolution::All => covered && verdicts.all(|v| v != Verdict::Failure),
            Resolution::Any => verdicts.any(|v| v == Verdict::Success),
            Resolution::AnyFail => verdicts.any(|v| v == Verdict::Failure),
            Resolution::None => covered && verdicts.all(|v| v != Verdict::Success),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resolution {0:?}, expected one of all, any, any-fail, none")]
pub struct ParseResolutionError(String);

impl std::str::FromStr for Resolution {
    type Err = ParseResolutionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Resolution::All),
            "any" => Ok(Resolution::Any),
            "any-fail" => Ok(Resolution::AnyFail),
            "none" => Ok(Resolution::None),
            other => Err(ParseResolutionError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListenerError;

    fn state(pending: usize) -> ResolutionState { ResolutionState { pending, stopped: false } }

    fn failed() -> Outcome<bool> { Outcome::Failed(ListenerError::Panicked("boom".into())) }

    #[test]
    fn test_parse_round_trip() {
        for resolution in [Resolution::All, Resolution::Any, Resolution::AnyFail, Resolution::None] {
            assert_eq!(resolution.as_str().parse::<Resolution>(), Ok(resolution));
        }
        assert!("some".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_all_waits_for_coverage() {
        let test = SuccessTest::default();
        let outcomes = vec![Outcome::Value(true)];
        assert!(!Resolution::All.is_resolved(&outcomes, &test, state(1)));
        assert!(Resolution::All.is_resolved(&outcomes, &test, state(0)));
        assert!(Resolution::All.is_resolved(&outcomes, &test, ResolutionState { pending: 1, stopped: true }));
    }

    #[test]
    fn test_all_rejects_failures() {
        let test = SuccessTest::default();
        let outcomes = vec![Outcome::Value(true), failed()];
        assert!(!Resolution::All.is_resolved(&outcomes, &test, state(0)));
    }

    #[test]
    fn test_empty_outcome_asymmetry() {
        let test = SuccessTest::<bool>::default();
        let outcomes = vec![Outcome::Empty];
        assert!(!Resolution::Any.is_resolved(&outcomes, &test, state(1)));
        assert!(!Resolution::AnyFail.is_resolved(&outcomes, &test, state(1)));
        assert!(Resolution::All.is_resolved(&outcomes, &test, state(0)));
        assert!(Resolution::None.is_resolved(&outcomes, &test, state(0)));
    }

    #[test]
    fn test_custom_success_test() {
        let test = SuccessTest::new(|value: &bool| *value);
        let outcomes = vec![Outcome::Value(false), Outcome::Value(false)];
        assert!(!Resolution::Any.is_resolved(&outcomes, &test, state(4)));
        assert!(Resolution::AnyFail.is_resolved(&outcomes, &test, state(4)));
        assert!(Resolution::None.is_resolved(&outcomes, &test, state(0)));
        assert!(!Resolution::None.is_resolved(&outcomes, &test, state(2)));

        let outcomes = vec![Outcome::Value(false), Outcome::Value(true)];
        assert!(Resolution::Any.is_resolved(&outcomes, &test, state(4)));
        assert!(!Resolution::None.is_resolved(&outcomes, &test, state(0)));
    }

    #[test]
    fn test_zero_listeners() {
        let test = SuccessTest::<bool>::default();
        assert!(Resolution::All.is_resolved(&[], &test, state(0)));
        assert!(Resolution::None.is_resolved(&[], &test, state(0)));
        assert!(!Resolution::Any.is_resolved(&[], &test, state(0)));
        assert!(!Resolution::AnyFail.is_resolved(&[], &test, state(0)));
    }
}

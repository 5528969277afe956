//! The fatal error taxonomy for the territory optimizer.
//!
//! A solve surfaces exactly one of `{SolveResult, FatalError}` (see
//! `terr_algo::SolveResult` and §7 of the design doc). [`FatalError`] is reserved for
//! programmer errors detectable *before* solving ever starts: a malformed
//! `Configuration` or an input set that violates a structural invariant. Everything
//! recoverable (no eligible rep, solver timeout, degraded fallback, …) is instead
//! accumulated as a warning inside `SolveResult`.

use thiserror::Error;

/// Errors that reject a `Configuration` at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Enabled objective weights for a segment (customer/prospect) don't sum to 1 ± 1e-6.
    #[error("{segment} objective weights sum to {sum:.6}, expected 1.0 \u{b1} 1e-6")]
    WeightsDoNotSumToOne { segment: String, sum: f64 },

    /// A weight component fell outside [0.0, 1.0].
    #[error("{segment}.{axis} weight {value} is outside [0, 1]")]
    WeightOutOfRange {
        segment: String,
        axis: String,
        value: f64,
    },

    /// A `priority_config` entry referenced an id that does not name a known priority kind.
    #[error("unknown priority id: {0}")]
    UnknownPriorityId(String),

    /// A day-window (renewal-soon, recent-change) or other threshold was negative.
    #[error("{field} must be non-negative, got {value}")]
    NegativeThreshold { field: String, value: f64 },

    /// A scoring constant that must lie in [0, 1] (e.g. a threshold) did not.
    #[error("{field} must be in [0, 1], got {value}")]
    ScoringConstantOutOfRange { field: String, value: f64 },
}

/// Errors that reject an input account/rep set before a solve starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputInvariantError {
    /// A child account's `parent_id` does not match any account in the input set.
    #[error("account {child} references unknown parent {parent}")]
    UnknownParent { child: String, parent: String },

    /// Two accounts or two reps shared the same id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// A rep named itself as its own backfill target.
    #[error("rep {0} names itself as its own backfill target")]
    SelfBackfill(String),
}

/// The only error type the public solve entry point can return as `Err`.
///
/// Anything else the pipeline encounters after this point is recorded as a warning in
/// the returned `SolveResult`, never thrown through the public API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FatalError {
    #[error("configuration invalid: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("input invariant violated: {0}")]
    InputInvariant(#[from] InputInvariantError),
}

pub type FatalResult<T> = Result<T, FatalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_converts_into_fatal_error() {
        let err: FatalError = ConfigurationError::WeightsDoNotSumToOne {
            segment: "customer".into(),
            sum: 0.8,
        }
        .into();
        assert!(matches!(err, FatalError::Configuration(_)));
        assert!(err.to_string().contains("customer"));
    }

    #[test]
    fn input_invariant_error_converts_into_fatal_error() {
        let err: FatalError = InputInvariantError::UnknownParent {
            child: "A-2".into(),
            parent: "A-1".into(),
        }
        .into();
        assert!(matches!(err, FatalError::InputInvariant(_)));
        assert!(err.to_string().contains("A-2"));
    }
}

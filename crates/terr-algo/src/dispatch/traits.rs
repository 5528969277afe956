//! Core traits for the solver dispatch Strategy pattern (§4.7), mirroring the
//! `OpfFormulation`/`OpfBackend` split: a `MipBackend` knows *how* to solve a given
//! `AssignmentProblem`, independent of *when* it is selected (that is the
//! dispatcher's job).

use std::time::Duration;

use crate::model::AssignmentProblem;

/// Outcome status of one solve attempt (§4.7). Anything other than `Optimal` must be
/// surfaced to the caller; `TimeLimit` solutions carry a usable best-incumbent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SolveStatus {
    Optimal,
    TimeLimit,
    Infeasible,
    Unbounded,
    Error,
}

/// The assignment extracted from a solved model: one rep id per account, plus the
/// realized objective value and any balance slack for metrics (C10).
#[derive(Debug, Clone, Default)]
pub struct MipSolution {
    pub status: Option<SolveStatus>,
    pub assignment: std::collections::HashMap<terr_core::AccountId, terr_core::RepId>,
    pub objective_value: f64,
    pub balance_slack_total: f64,
    pub solve_time_ms: u64,
}

impl MipSolution {
    pub fn is_usable(&self) -> bool {
        matches!(self.status, Some(SolveStatus::Optimal) | Some(SolveStatus::TimeLimit))
    }
}

/// Errors a backend can raise attempting to solve (§7). These are caught by the
/// dispatcher and turned into a fallback attempt or a diagnostics warning: never
/// propagated as `FatalError`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("solve exceeded time budget")]
    TimedOut,
    #[error("problem infeasible")]
    Infeasible,
    #[error("solver error: {0}")]
    Solver(String),
    #[error("network error contacting remote solver: {0}")]
    Network(String),
    #[error("remote solver rejected request: {0}")]
    RemoteRejected(String),
}

/// Implements one way of solving an `AssignmentProblem` (how to solve it).
///
/// Backends are registered once per `SolverSession` (C7) and selected by problem size
/// and runtime availability, never by a hardcoded `if`-chain in the dispatcher.
pub trait MipBackend: Send + Sync {
    /// Unique identifier (e.g. "highs", "cbc", "remote").
    fn id(&self) -> &str;

    /// Whether this backend can be used right now (feature compiled in, binary found,
    /// endpoint configured, etc.).
    fn is_available(&self) -> bool;

    /// Attempt to solve within the given time budget.
    fn solve(&self, problem: &AssignmentProblem, budget: Duration) -> Result<MipSolution, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe_and_send_sync() {
        fn _accepts(_b: &dyn MipBackend) {}
        fn _assert_send<T: Send>() {}
        fn _assert_sync<T: Sync>() {}
        _assert_send::<Box<dyn MipBackend>>();
        _assert_sync::<Box<dyn MipBackend>>();
    }

    #[test]
    fn time_limit_solution_is_usable() {
        let solution = MipSolution {
            status: Some(SolveStatus::TimeLimit),
            ..Default::default()
        };
        assert!(solution.is_usable());
    }

    #[test]
    fn infeasible_solution_is_not_usable() {
        let solution = MipSolution {
            status: Some(SolveStatus::Infeasible),
            ..Default::default()
        };
        assert!(!solution.is_usable());
    }
}

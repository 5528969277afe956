//! Remote MIP backend (§4.7 step 2, §6.2): renders the problem to CPLEX LP text and
//! posts it to a configured HTTP endpoint via `terr-solver`'s client.

use std::time::{Duration, Instant};

use terr_solver::{LpRequest, RemoteSolverClient, RemoteStatus, SolverError as RemoteSolverError};

use super::traits::{BackendError, MipBackend, MipSolution, SolveStatus};
use crate::model::{to_lp_text, AssignmentProblem};

/// Parses `x#<account>#<rep>` variable names produced by [`to_lp_text`] back into
/// assignment pairs.
fn parse_assignment_var(name: &str) -> Option<(terr_core::AccountId, terr_core::RepId)> {
    let rest = name.strip_prefix("x#")?;
    let (account, rep) = rest.split_once('#')?;
    Some((terr_core::AccountId::new(account), terr_core::RepId::new(rep)))
}

pub struct RemoteBackend {
    client: Option<RemoteSolverClient>,
}

impl RemoteBackend {
    /// `endpoint: None` means the backend reports itself unavailable without ever
    /// attempting a connection: the common case when no remote service is configured.
    pub fn new(endpoint: Option<&str>) -> Self {
        Self {
            client: endpoint.map(RemoteSolverClient::new),
        }
    }
}

impl MipBackend for RemoteBackend {
    fn id(&self) -> &str {
        "remote"
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    fn solve(&self, problem: &AssignmentProblem, _budget: Duration) -> Result<MipSolution, BackendError> {
        let start = Instant::now();
        let Some(client) = &self.client else {
            return Err(BackendError::Unavailable("no remote endpoint configured".into()));
        };
        if problem.is_empty() {
            return Ok(MipSolution {
                status: Some(SolveStatus::Optimal),
                ..Default::default()
            });
        }

        let lp_text = to_lp_text(problem);
        let request = LpRequest::new(lp_text);
        let response = client.solve(&request).map_err(|err| match err {
            RemoteSolverError::RemoteRejected { status, body } => {
                BackendError::RemoteRejected(format!("HTTP {status}: {body}"))
            }
            other => BackendError::Network(other.to_string()),
        })?;

        let status = match response.status {
            RemoteStatus::Optimal => SolveStatus::Optimal,
            RemoteStatus::TimeLimit => SolveStatus::TimeLimit,
            RemoteStatus::Infeasible => SolveStatus::Infeasible,
            RemoteStatus::Unbounded => SolveStatus::Unbounded,
            RemoteStatus::Error => SolveStatus::Error,
        };

        let mut assignment = std::collections::HashMap::new();
        for (name, primal) in &response.columns {
            if primal.primal > 0.5 {
                if let Some((account_id, rep_id)) = parse_assignment_var(name) {
                    assignment.insert(account_id, rep_id);
                }
            }
        }

        Ok(MipSolution {
            status: Some(status),
            assignment,
            objective_value: response.objective_value,
            balance_slack_total: 0.0,
            solve_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_backend_is_unavailable() {
        let backend = RemoteBackend::new(None);
        assert!(!backend.is_available());
    }

    #[test]
    fn configured_backend_is_available() {
        let backend = RemoteBackend::new(Some("https://solver.example.com/lp"));
        assert!(backend.is_available());
    }

    #[test]
    fn parses_assignment_variable_names() {
        let (account, rep) = parse_assignment_var("x#A-100#R-7").unwrap();
        assert_eq!(account.value(), "A-100");
        assert_eq!(rep.value(), "R-7");
    }

    #[test]
    fn rejects_malformed_variable_names() {
        assert!(parse_assignment_var("u#arr#R-7").is_none());
        assert!(parse_assignment_var("garbage").is_none());
    }
}

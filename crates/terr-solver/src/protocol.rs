//! Wire types for the remote MIP service (§6.2): an LP-text request and a JSON response.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Status string the remote service reports, verbatim from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteStatus {
    #[serde(rename = "Optimal")]
    Optimal,
    #[serde(rename = "Infeasible")]
    Infeasible,
    #[serde(rename = "Unbounded")]
    Unbounded,
    #[serde(rename = "Time limit")]
    TimeLimit,
    #[serde(rename = "Error")]
    Error,
}

/// One non-zero variable's value in the remote solution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Primal {
    #[serde(rename = "Primal")]
    pub primal: f64,
}

/// The JSON body the remote service returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpResponse {
    pub status: RemoteStatus,
    #[serde(rename = "objectiveValue")]
    pub objective_value: f64,
    /// Only non-zero variables need appear.
    pub columns: HashMap<String, Primal>,
    #[serde(rename = "solveTimeMs")]
    pub solve_time_ms: u64,
}

impl LpResponse {
    /// Value of `column`, or 0.0 if it was omitted as a zero.
    pub fn value(&self, column: &str) -> f64 {
        self.columns.get(column).map(|p| p.primal).unwrap_or(0.0)
    }
}

/// The outbound request body: raw CPLEX LP text, posted with `Content-Type: text/plain`.
#[derive(Debug, Clone)]
pub struct LpRequest {
    pub lp_text: String,
}

impl LpRequest {
    pub fn new(lp_text: String) -> Self {
        Self { lp_text }
    }
}

//! HTTP client for the remote MIP service (§6.2), built on `ureq`: the same HTTP
//! client the teacher's `gat-cli` reaches for when it needs a blocking request.
//!
//! Retry policy: 4xx is a client error in the LP body and is never retried; 5xx or a
//! network-level failure is retried once after a 1s backoff, after which the caller
//! should treat remote as unavailable for this solve.

use std::time::Duration;

use crate::error::{SolverError, SolverResult};
use crate::protocol::{LpRequest, LpResponse};

const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// A configured remote MIP service endpoint.
pub struct RemoteSolverClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl RemoteSolverClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn with_agent(endpoint: impl Into<String>, agent: ureq::Agent) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    /// Post `request`'s LP text and parse the JSON response. Retries once on 5xx or
    /// network error, per §6.2; a 4xx fails immediately without retry.
    pub fn solve(&self, request: &LpRequest) -> SolverResult<LpResponse> {
        match self.post(request) {
            Ok(resp) => Ok(resp),
            Err(SolverError::RemoteRejected { status, body }) => {
                Err(SolverError::RemoteRejected { status, body })
            }
            Err(_) => {
                std::thread::sleep(RETRY_BACKOFF);
                self.post(request)
            }
        }
    }

    fn post(&self, request: &LpRequest) -> SolverResult<LpResponse> {
        let result = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "text/plain")
            .send_string(&request.lp_text);

        match result {
            Ok(response) => {
                let body = response
                    .into_string()
                    .map_err(|e| SolverError::Parse(e.to_string()))?;
                serde_json::from_str(&body).map_err(|e| SolverError::Parse(e.to_string()))
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                if (400..500).contains(&status) {
                    Err(SolverError::RemoteRejected { status, body })
                } else {
                    Err(SolverError::Network(format!("HTTP {status}: {body}")))
                }
            }
            Err(ureq::Error::Transport(transport)) => Err(SolverError::Network(transport.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_lp_text_verbatim() {
        let req = LpRequest::new("Minimize\n obj: x\nEnd\n".to_string());
        assert!(req.lp_text.starts_with("Minimize"));
    }
}

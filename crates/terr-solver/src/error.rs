//! Error types for the remote MIP service client.

use thiserror::Error;

/// Errors that can occur while talking to the remote MIP solver service.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The remote endpoint rejected the request body (4xx). Not retried.
    #[error("remote solver rejected request: HTTP {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    /// Network failure or 5xx after the single retry-with-backoff was exhausted.
    #[error("remote solver unreachable after retry: {0}")]
    Network(String),

    /// The response body was not valid JSON or was missing required fields.
    #[error("failed to parse remote solver response: {0}")]
    Parse(String),

    /// Daily remote-call quota has already been exhausted for this process/day.
    #[error("daily remote solver quota ({0}) exhausted")]
    QuotaExhausted(u32),

    /// No remote endpoint is configured.
    #[error("no remote solver endpoint configured")]
    NoEndpointConfigured,

    /// Failed to read or write the persistent quota store.
    #[error("quota store error: {0}")]
    QuotaStore(String),
}

pub type SolverResult<T> = Result<T, SolverError>;

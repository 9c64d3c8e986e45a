use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the two job-service calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("Failed to fetch {what} (HTTP {status})")]
    Status {
        what: &'static str,
        status: StatusCode,
    },

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("Could not reach the job service: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Invalid response from server")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Status { .. } | ApiError::Transport(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter both keywords and a location.")]
    MissingField,
}

//! Decision client error types.

use std::time::Duration;

use thiserror::Error;

/// Failures talking to, or configuring, the decision provider.
#[derive(Debug, Error)]
pub enum ShieldError {
    /// No provider credential was configured.
    #[error("decision provider credential is not configured")]
    MissingCredential,

    /// The HTTP client could not be built or the request failed in transit.
    #[error("decision provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("decision provider returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The provider answered, but the body was not a decision.
    #[error("undecodable decision: {0}")]
    Decode(String),

    /// The call did not complete within the deadline.
    #[error("decision provider timed out after {0:?}")]
    Timeout(Duration),

    /// The credential cannot be carried in an HTTP header.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}

/// Result type for decision client operations.
pub type Result<T> = std::result::Result<T, ShieldError>;

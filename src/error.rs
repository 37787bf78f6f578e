//! Error types for eventwire-client.

use std::time::Duration;

use thiserror::Error;

/// Main error type for all eventwire operations.
#[derive(Debug, Error)]
pub enum EventwireError {
    /// HTTP transport error (connect, TLS, body read).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Producer rejected the request with an error status.
    ///
    /// Carries the `message` field of the producer's JSON error body
    /// when one was present.
    #[error("server returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation exceeded its deadline.
    ///
    /// Distinct from [`EventwireError::Http`] so callers can
    /// special-case timeouts.
    #[error("operation '{label}' timed out after {duration:?}")]
    Timeout { label: String, duration: Duration },

    /// All retry attempts exhausted (or the failure was non-retryable).
    ///
    /// `last` wraps the message of the final underlying error.
    #[error("operation failed after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Stream cancelled by the consumer before completion.
    #[error("stream interrupted")]
    Interrupted,
}

impl EventwireError {
    /// Whether this error is the distinguishable timeout kind.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EventwireError::Timeout { .. })
    }
}

/// Result type alias using EventwireError.
pub type Result<T> = std::result::Result<T, EventwireError>;

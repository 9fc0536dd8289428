//! Error types for zone synchronization
//!
//! This module defines all error types used throughout the workspace.

use crate::batch::BatchSummary;
use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// A record or zone the provider cannot accept as configured.
    ///
    /// Always raised before any network call is made.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failures (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status not covered by a more specific variant
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The API rejected the request payload (HTTP 400)
    #[error("{}", format_bad_request(.0))]
    BadRequest(Vec<String>),

    /// Authentication errors (HTTP 401/403)
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found (HTTP 404)
    #[error("Not Found")]
    NotFound,

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// A batch failed after earlier batches of the same apply were committed
    #[error(
        "Partial apply of zone {zone}: {} batch(es) applied, batch {failed} failed, {} not attempted: {source}",
        .applied.len(),
        .not_attempted.len()
    )]
    PartialApply {
        /// Zone being applied
        zone: String,
        /// Batches that were committed before the failure
        applied: Vec<BatchSummary>,
        /// The batch whose submission failed
        failed: BatchSummary,
        /// Batches never submitted
        not_attempted: Vec<BatchSummary>,
        /// Underlying failure
        source: Box<Error>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn format_bad_request(errors: &[String]) -> String {
    let joined = errors.join("\n  - ");
    format!("\n  - {}", joined)
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an API status error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same work later may succeed.
    ///
    /// Transport failures, rate limiting and 5xx responses are transient;
    /// a partial apply is transient when its underlying failure is.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            Error::PartialApply { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchKind;

    #[test]
    fn bad_request_lists_every_api_error() {
        let err = Error::BadRequest(vec!["Rate limit exceeded".to_string()]);
        assert_eq!(err.to_string(), "\n  - Rate limit exceeded");

        let err = Error::BadRequest(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(err.to_string(), "\n  - one\n  - two");
    }

    #[test]
    fn status_errors_display_like_the_api() {
        assert_eq!(Error::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(Error::NotFound.to_string(), "Not Found");
    }

    #[test]
    fn transient_classification() {
        assert!(Error::http("connection reset").is_transient());
        assert!(Error::api(502, "Bad Gateway").is_transient());
        assert!(Error::api(429, "Too Many Requests").is_transient());
        assert!(!Error::api(409, "Conflict").is_transient());
        assert!(!Error::Unauthorized.is_transient());
        assert!(!Error::validation("bad CAA tag").is_transient());

        let partial = Error::PartialApply {
            zone: "example.com.".to_string(),
            applied: vec![],
            failed: BatchSummary {
                kind: BatchKind::Create,
                index: 0,
                size: 2,
            },
            not_attempted: vec![],
            source: Box::new(Error::api(500, "boom")),
        };
        assert!(partial.is_transient());
    }
}

//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Connection-level failure before a response arrived
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Request did not complete within the configured timeout
    #[error("Embedding request timed out after {0}s")]
    Timeout(u64),

    /// Provider is rate limiting us
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider misconfigured (missing key, bad URL, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Transport(_)
            | EmbeddingError::Timeout(_)
            | EmbeddingError::RateLimitExceeded => true,
            EmbeddingError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(EmbeddingError::Timeout(30).is_transient());
        assert!(EmbeddingError::RateLimitExceeded.is_transient());
        assert!(EmbeddingError::Transport("connection reset".to_string()).is_transient());
        assert!(EmbeddingError::Http {
            status: 503,
            body: "unavailable".to_string()
        }
        .is_transient());
        assert!(!EmbeddingError::Http {
            status: 400,
            body: "bad request".to_string()
        }
        .is_transient());
        assert!(!EmbeddingError::DimensionMismatch {
            expected: 768,
            actual: 700
        }
        .is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = EmbeddingError::Http {
            status: 401,
            body: "API key not valid".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 401: API key not valid");
    }
}

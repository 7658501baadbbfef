//! Error types for configuration and corpus handling.

use thiserror::Error;

/// Unified error type for settings and record ingestion.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RosterError::InvalidInput("duplicate record id: user_1".to_string());
        assert_eq!(err.to_string(), "Invalid input: duplicate record id: user_1");

        let err = RosterError::Config("top_k must be >= 1".to_string());
        assert_eq!(err.to_string(), "Configuration error: top_k must be >= 1");
    }
}

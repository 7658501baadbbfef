//! Error types for index building.

use roster_embeddings::EmbeddingError;
use roster_types::RosterError;
use roster_vector::VectorError;
use thiserror::Error;

/// Errors that can occur while building an index
#[derive(Error, Debug)]
pub enum IndexingError {
    /// A provider returned a vector of the wrong length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Embedding(EmbeddingError),

    /// Vector store or artifact error
    #[error("Vector error: {0}")]
    Vector(VectorError),

    /// Records rejected before any embedding call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A worker task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

impl From<EmbeddingError> for IndexingError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DimensionMismatch { expected, actual } => {
                IndexingError::DimensionMismatch { expected, actual }
            }
            other => IndexingError::Embedding(other),
        }
    }
}

impl From<VectorError> for IndexingError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::DimensionMismatch { expected, actual } => {
                IndexingError::DimensionMismatch { expected, actual }
            }
            other => IndexingError::Vector(other),
        }
    }
}

impl From<RosterError> for IndexingError {
    fn from(err: RosterError) -> Self {
        IndexingError::InvalidInput(err.to_string())
    }
}

impl From<tokio::task::JoinError> for IndexingError {
    fn from(err: tokio::task::JoinError) -> Self {
        IndexingError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexingError::InvalidInput("duplicate id group_1".to_string());
        assert_eq!(err.to_string(), "Invalid input: duplicate id group_1");

        let err = IndexingError::DimensionMismatch {
            expected: 768,
            actual: 700,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 768, got 700");
    }

    #[test]
    fn test_dimension_mismatch_is_lifted() {
        let err: IndexingError = EmbeddingError::DimensionMismatch {
            expected: 768,
            actual: 700,
        }
        .into();
        assert!(matches!(
            err,
            IndexingError::DimensionMismatch {
                expected: 768,
                actual: 700
            }
        ));

        let err: IndexingError = VectorError::DimensionMismatch {
            expected: 4,
            actual: 3,
        }
        .into();
        assert!(matches!(err, IndexingError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_other_errors_are_wrapped() {
        let err: IndexingError = EmbeddingError::RateLimitExceeded.into();
        assert!(matches!(err, IndexingError::Embedding(_)));

        let err: IndexingError = VectorError::Corruption("bad".to_string()).into();
        assert!(matches!(err, IndexingError::Vector(_)));
    }
}

//! Query error types.

use roster_embeddings::EmbeddingError;
use roster_vector::VectorError;
use thiserror::Error;

/// Errors that can occur while answering a query
#[derive(Error, Debug)]
pub enum QueryError {
    /// Query embedding has the wrong length for the index
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding provider failed
    #[error("Embedding error: {0}")]
    Embedding(EmbeddingError),

    /// Persisted index is inconsistent
    #[error("Index corruption: {0}")]
    IndexCorruption(String),

    /// Any other vector store error
    #[error("Vector error: {0}")]
    Vector(VectorError),

    /// Selection was not a number between 1 and the candidate count
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// No candidates were found
    #[error("No match found")]
    NoMatch,

    /// Query text or parameters rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<EmbeddingError> for QueryError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DimensionMismatch { expected, actual } => {
                QueryError::DimensionMismatch { expected, actual }
            }
            other => QueryError::Embedding(other),
        }
    }
}

impl From<VectorError> for QueryError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::DimensionMismatch { expected, actual } => {
                QueryError::DimensionMismatch { expected, actual }
            }
            VectorError::Corruption(msg) => QueryError::IndexCorruption(msg),
            other => QueryError::Vector(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(QueryError::NoMatch.to_string(), "No match found");
        assert_eq!(
            QueryError::InvalidSelection("abc".to_string()).to_string(),
            "Invalid selection: abc"
        );
    }

    #[test]
    fn test_conversions() {
        let err: QueryError = EmbeddingError::DimensionMismatch {
            expected: 768,
            actual: 700,
        }
        .into();
        assert!(matches!(
            err,
            QueryError::DimensionMismatch {
                expected: 768,
                actual: 700
            }
        ));

        let err: QueryError = VectorError::Corruption("build id".to_string()).into();
        assert!(matches!(err, QueryError::IndexCorruption(_)));

        let err: QueryError = VectorError::NotFound("/tmp/x".to_string()).into();
        assert!(matches!(err, QueryError::Vector(VectorError::NotFound(_))));
    }
}

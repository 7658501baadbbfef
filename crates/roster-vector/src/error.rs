//! Vector index error types.

use thiserror::Error;

/// Errors that can occur during vector operations.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector and record halves of the artifact disagree or are damaged
    #[error("Index corruption: {0}")]
    Corruption(String),

    /// No artifact at the given location
    #[error("Index not found: {0}")]
    NotFound(String),

    /// Record id already present in the store
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

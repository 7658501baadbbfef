//! Embedding model trait and types.
//!
//! Defines the interface for generating vector embeddings from text.

use crate::error::EmbeddingError;

/// Vector embedding as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector, stored as received (not normalized)
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Check that this embedding has exactly `expected` components.
    pub fn check_dimension(&self, expected: usize) -> Result<(), EmbeddingError> {
        if self.dimension() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            });
        }
        Ok(())
    }
}

/// Squared Euclidean distance. Slices must have equal length.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name (e.g., "text-embedding-004")
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
}

/// Trait for embedding models.
///
/// Implementations must be thread-safe (Send + Sync); the index builder calls
/// `embed` from several blocking workers at once. Calls block until the
/// provider answers, fails, or times out.
pub trait EmbeddingModel: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate embedding for a single text.
    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;
}

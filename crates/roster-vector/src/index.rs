//! Vector index trait and types.
//!
//! Defines the interface for nearest-neighbor search over stored embeddings.

use roster_embeddings::Embedding;

use crate::error::VectorError;

/// One nearest-neighbor hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Insertion position of the stored vector
    pub position: usize,
    /// Squared Euclidean distance to the query (lower = more similar)
    pub distance: f32,
}

impl SearchHit {
    pub fn new(position: usize, distance: f32) -> Self {
        Self { position, distance }
    }
}

/// Index statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of vectors in the index
    pub vector_count: usize,
    /// Embedding dimension
    pub dimension: usize,
    /// Bytes held by vector data
    pub size_bytes: u64,
}

/// Trait for vector indexes.
///
/// Positions are assigned in insertion order starting at 0 and never change.
pub trait VectorIndex: Send + Sync {
    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the number of vectors in the index
    fn len(&self) -> usize;

    /// Check if the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a vector at the next free position and return that position.
    fn add(&mut self, embedding: &Embedding) -> Result<usize, VectorError>;

    /// Search for up to k nearest neighbors.
    /// Returns hits by ascending distance; equal distances by ascending position.
    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchHit>, VectorError>;

    /// Get index statistics
    fn stats(&self) -> IndexStats;
}

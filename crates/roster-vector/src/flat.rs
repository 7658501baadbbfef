//! Exact flat index.
//!
//! Vectors live in one contiguous buffer; search scans every vector and
//! computes squared Euclidean distance. Corpora here are a few thousand short
//! records, so an exact scan is cheap and keeps results reproducible.

use std::cmp::Ordering;

use roster_embeddings::model::squared_l2;
use roster_embeddings::Embedding;
use tracing::debug;

use crate::error::VectorError;
use crate::index::{IndexStats, SearchHit, VectorIndex};

/// Brute-force L2 index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Rebuild from a flat buffer of `len / dimension` vectors.
    pub fn from_raw(dimension: usize, data: Vec<f32>) -> Result<Self, VectorError> {
        if dimension == 0 || data.len() % dimension != 0 {
            return Err(VectorError::Corruption(format!(
                "{} values do not form whole vectors of dimension {}",
                data.len(),
                dimension
            )));
        }
        Ok(Self { dimension, data })
    }

    /// Vector stored at `position`.
    pub fn get(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// All vector values, position-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<(), VectorError> {
        if embedding.dimension() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.dimension(),
            });
        }
        Ok(())
    }
}

fn by_distance_then_position(a: &SearchHit, b: &SearchHit) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.position.cmp(&b.position))
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn add(&mut self, embedding: &Embedding) -> Result<usize, VectorError> {
        self.check_dimension(embedding)?;

        let position = self.len();
        self.data.extend_from_slice(&embedding.values);

        debug!(position, "Added vector");
        Ok(position)
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchHit>, VectorError> {
        self.check_dimension(query)?;

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, stored)| SearchHit::new(position, squared_l2(&query.values, stored)))
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, by_distance_then_position);
            hits.truncate(k);
        }
        hits.sort_by(by_distance_then_position);

        debug!(k, found = hits.len(), "Search complete");
        Ok(hits)
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            vector_count: self.len(),
            dimension: self.dimension,
            size_bytes: (self.data.len() * std::mem::size_of::<f32>()) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_embedding(dim: usize) -> Embedding {
        use rand::Rng;
        let mut rng = rand::rng();
        let values: Vec<f32> = (0..dim).map(|_| rng.random()).collect();
        Embedding::new(values)
    }

    #[test]
    fn test_create_index() {
        let index = FlatIndex::new(768);
        assert_eq!(index.dimension(), 768);
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_positions_are_sequential() {
        let mut index = FlatIndex::new(8);
        for expected in 0..5 {
            let position = index.add(&random_embedding(8)).unwrap();
            assert_eq!(position, expected);
        }
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_exact_vector_found_at_distance_zero() {
        let mut index = FlatIndex::new(64);
        let stored: Vec<Embedding> = (0..20).map(|_| random_embedding(64)).collect();
        for emb in &stored {
            index.add(emb).unwrap();
        }

        for (position, emb) in stored.iter().enumerate() {
            let hits = index.search(emb, 1).unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].position, position);
            assert_eq!(hits[0].distance, 0.0);
        }
    }

    #[test]
    fn test_results_sorted_by_distance() {
        let mut index = FlatIndex::new(32);
        for _ in 0..50 {
            index.add(&random_embedding(32)).unwrap();
        }

        let hits = index.search(&random_embedding(32), 10).unwrap();
        assert_eq!(hits.len(), 10);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_partial_selection_matches_full_sort() {
        let mut index = FlatIndex::new(16);
        for _ in 0..100 {
            index.add(&random_embedding(16)).unwrap();
        }
        let query = random_embedding(16);

        let top = index.search(&query, 7).unwrap();
        let all = index.search(&query, 100).unwrap();
        assert_eq!(top, all[..7].to_vec());
    }

    #[test]
    fn test_ties_broken_by_position() {
        let mut index = FlatIndex::new(2);
        index.add(&Embedding::new(vec![1.0, 0.0])).unwrap();
        index.add(&Embedding::new(vec![0.0, 1.0])).unwrap();
        index.add(&Embedding::new(vec![-1.0, 0.0])).unwrap();
        index.add(&Embedding::new(vec![0.0, -1.0])).unwrap();

        // The origin is equidistant from all four.
        let hits = index.search(&Embedding::new(vec![0.0, 0.0]), 3).unwrap();
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(hits.iter().all(|h| (h.distance - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_k_larger_than_index() {
        let mut index = FlatIndex::new(4);
        index.add(&random_embedding(4)).unwrap();
        index.add(&random_embedding(4)).unwrap();
        assert_eq!(index.search(&random_embedding(4), 10).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = FlatIndex::new(4);
        assert!(index.search(&random_embedding(4), 3).unwrap().is_empty());
    }

    #[test]
    fn test_zero_k_returns_nothing() {
        let mut index = FlatIndex::new(4);
        index.add(&random_embedding(4)).unwrap();
        assert!(index.search(&random_embedding(4), 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = FlatIndex::new(768);

        let wrong_dim = random_embedding(700);
        let result = index.add(&wrong_dim);
        assert!(matches!(
            result,
            Err(VectorError::DimensionMismatch {
                expected: 768,
                actual: 700
            })
        ));
        assert_eq!(index.len(), 0);

        let result = index.search(&wrong_dim, 1);
        assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_from_raw_rejects_partial_vectors() {
        assert!(FlatIndex::from_raw(3, vec![0.0; 7]).is_err());
        let index = FlatIndex::from_raw(3, vec![0.0; 9]).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(2), Some(&[0.0, 0.0, 0.0][..]));
        assert_eq!(index.get(3), None);
    }

    #[test]
    fn test_stats() {
        let mut index = FlatIndex::new(4);
        index.add(&random_embedding(4)).unwrap();
        let stats = index.stats();
        assert_eq!(stats.vector_count, 1);
        assert_eq!(stats.dimension, 4);
        assert_eq!(stats.size_bytes, 16);
    }
}

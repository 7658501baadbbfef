//! Mock embedder for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Mock embedder that returns deterministic vectors.
///
/// Texts registered with [`MockEmbedder::with_vector`] get exactly that
/// vector back. Any other text gets a vector derived from an FNV-1a hash of
/// the text, so the same text always embeds the same way. Texts registered
/// with [`MockEmbedder::failing_on`] produce a provider error.
pub struct MockEmbedder {
    info: ModelInfo,
    vectors: HashMap<String, Vec<f32>>,
    failures: HashMap<String, u16>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    /// Create a new mock embedder for the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            info: ModelInfo {
                name: "mock-embedder".to_string(),
                dimension,
            },
            vectors: HashMap::new(),
            failures: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `values` whenever `text` is embedded.
    ///
    /// `values` may have a different length than the configured dimension, to
    /// simulate a misbehaving provider.
    pub fn with_vector(mut self, text: impl Into<String>, values: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), values);
        self
    }

    /// Fail with an HTTP error whenever `text` is embedded.
    pub fn failing_on(mut self, text: impl Into<String>, status: u16) -> Self {
        self.failures.insert(text.into(), status);
        self
    }

    /// Number of embed calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hashed_vector(&self, text: &str) -> Vec<f32> {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in text.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }

        (0..self.info.dimension)
            .map(|i| {
                let mixed = hash.rotate_left((i % 64) as u32) ^ (i as u64).wrapping_mul(0x9e37_79b9);
                (mixed % 1000) as f32 / 1000.0
            })
            .collect()
    }
}

impl EmbeddingModel for MockEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = self.failures.get(text) {
            return Err(EmbeddingError::Http {
                status: *status,
                body: format!("mock failure for '{}'", text),
            });
        }

        let values = match self.vectors.get(text) {
            Some(values) => values.clone(),
            None => self.hashed_vector(text),
        };
        Ok(Embedding::new(values))
    }
}

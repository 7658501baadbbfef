//! # roster-embeddings
//!
//! Text embedding for the roster finder.
//!
//! The core only sees the [`EmbeddingModel`] trait: text in, fixed-length
//! vector out. Two implementations ship here:
//! - [`GeminiEmbedder`]: Google `embedContent` API with timeout and retry
//! - [`MockEmbedder`]: deterministic lookup table for tests
//!
//! Any retry policy lives inside a provider; callers treat a returned error
//! as final.

pub mod error;
pub mod gemini;
pub mod mock;
pub mod model;

pub use error::EmbeddingError;
pub use gemini::{GeminiConfig, GeminiEmbedder, DEFAULT_GEMINI_BASE_URL};
pub use mock::MockEmbedder;
pub use model::{Embedding, EmbeddingModel, ModelInfo};

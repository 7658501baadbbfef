//! # roster-vector
//!
//! Vector index and record store for the roster finder.
//!
//! Embeddings and records are kept in one [`IndexStore`]: position `i` of the
//! vector index and position `i` of the record list always describe the same
//! record, because the only way in is [`IndexStore::push`], which appends to
//! both halves in one step.
//!
//! ## Features
//! - Exact flat index, squared Euclidean distance, ties broken by position
//! - Append-only positions, no deletion or update
//! - Co-versioned on-disk artifact (`vectors.bin` + `records.json`)

pub mod artifact;
pub mod error;
pub mod flat;
pub mod index;
pub mod store;

pub use artifact::{
    read_manifest, ArtifactManifest, ARTIFACT_FORMAT_VERSION, RECORDS_FILE, VECTORS_FILE,
};
pub use error::VectorError;
pub use flat::FlatIndex;
pub use index::{IndexStats, SearchHit, VectorIndex};
pub use store::{IndexStore, Neighbor};

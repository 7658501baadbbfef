//! Index building for the roster finder.
//!
//! Turns normalized [`Record`](roster_types::Record)s into a populated
//! [`IndexStore`](roster_vector::IndexStore) and persists it.
//!
//! ## Key Components
//!
//! - [`IndexBuilder`]: embeds records and fills the store in record order
//! - [`BuildConfig`]: worker count and expected embedding dimension
//! - [`rebuild_index`]: build, then save the artifact
//! - [`ProgressCallback`]: progress hook, with a logging implementation
//!
//! ## Example
//!
//! ```ignore
//! use roster_indexing::{rebuild_index, BuildConfig, IndexBuilder, LoggingProgressCallback};
//!
//! let builder = IndexBuilder::new(embedder, BuildConfig::new(768).with_workers(4));
//! let report = rebuild_index(&builder, records, &index_dir, &LoggingProgressCallback::new(100)).await?;
//! ```

pub mod builder;
pub mod error;
pub mod progress;
pub mod rebuild;

pub use builder::{BuildConfig, IndexBuilder};
pub use error::IndexingError;
pub use progress::{BuildProgress, LoggingProgressCallback, NoOpProgressCallback, ProgressCallback};
pub use rebuild::{rebuild_index, BuildReport};

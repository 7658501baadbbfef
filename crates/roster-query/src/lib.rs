//! # roster-query
//!
//! Query engine and disambiguation policy for the roster finder.
//!
//! A query is embedded, matched against the [`IndexStore`](roster_vector::IndexStore)
//! by squared Euclidean distance, and the ranked candidates are turned into a
//! [`Resolution`]:
//!
//! - **NoMatch**: nothing in the index
//! - **Single**: one candidate, or a clear winner
//! - **Ambiguous**: the top two are closer than the tie threshold; the caller
//!   shows every [`Summary`] and passes a 1-based selection to
//!   [`AmbiguousChoice::select`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roster_query::{QueryConfig, QueryEngine, Resolution};
//!
//! let engine = QueryEngine::open(embedder, &index_dir, QueryConfig::default())?;
//! match engine.resolve("district health officer")? {
//!     Resolution::NoMatch => println!("No match found"),
//!     Resolution::Single { candidate } => println!("{}", candidate.detail()),
//!     Resolution::Ambiguous(choice) => {
//!         println!("{}", choice);
//!         let picked = choice.select(&read_line()?)?;
//!         println!("{}", picked.detail());
//!     }
//! }
//! ```

pub mod disambiguation;
pub mod engine;
pub mod error;
pub mod view;

pub use disambiguation::{
    disambiguate, parse_selection, AmbiguousChoice, Candidate, Resolution, DEFAULT_TIE_THRESHOLD,
};
pub use engine::{QueryConfig, QueryEngine};
pub use error::QueryError;
pub use view::{Detail, Summary};

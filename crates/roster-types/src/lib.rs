//! # roster-types
//!
//! Shared domain types for the roster finder.
//!
//! This crate defines the data structures used throughout the system:
//! - Records: normalized group and user profiles, one per retrievable entity
//! - Corpus: normalization of sheet exports into ordered, validated records
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use roster_types::{GroupProfile, Profile, Record, RecordKind};
//!
//! let record = Record::new(
//!     "group_7",
//!     "Group Name: Finance. Description: Budgets.",
//!     Profile::Group(GroupProfile {
//!         group_id: "7".to_string(),
//!         name: "finance".to_string(),
//!         level: "District".to_string(),
//!         description: "Budgets".to_string(),
//!         alternate_names: vec![],
//!     }),
//! );
//! assert_eq!(record.kind(), RecordKind::Group);
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod record;

pub use config::{BuildSettings, EmbeddingSettings, QuerySettings, Settings};
pub use corpus::{load_corpus, load_records, normalize, validate_records, Corpus, GroupRow, UserRow};
pub use error::RosterError;
pub use record::{title_case, GroupProfile, Profile, Record, RecordKind, UserProfile};

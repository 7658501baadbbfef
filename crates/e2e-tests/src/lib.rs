//! End-to-end test infrastructure for the roster finder.
//!
//! Provides a shared TestHarness and helper functions for E2E tests covering
//! the full ingest-to-query pipeline: sheet export, normalization, build,
//! persisted artifact, query and disambiguation.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use roster_embeddings::MockEmbedder;
use roster_indexing::{rebuild_index, BuildConfig, BuildReport, IndexBuilder, NoOpProgressCallback};
use roster_query::{QueryConfig, QueryEngine};
use roster_types::{load_corpus, Record};

/// Embedding dimension used by the harness.
pub const TEST_DIMENSION: usize = 4;

/// Shared test harness for E2E tests.
///
/// Owns a temp directory with a sheet export and an index directory.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Sheet export written by [`TestHarness::new`]
    pub corpus_path: PathBuf,
    /// Directory the index artifact is written to
    pub index_dir: PathBuf,
}

impl TestHarness {
    /// Create a harness with [`sample_corpus`] on disk and an empty index dir.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let corpus_path = temp_dir.path().join("corpus.json");
        let index_dir = temp_dir.path().join("index");

        std::fs::write(
            &corpus_path,
            serde_json::to_vec_pretty(&sample_corpus()).expect("Failed to serialize corpus"),
        )
        .expect("Failed to write corpus");

        Self {
            _temp_dir: temp_dir,
            corpus_path,
            index_dir,
        }
    }

    /// Normalize the sample corpus.
    pub fn records(&self) -> Vec<Record> {
        load_corpus(&self.corpus_path).expect("Failed to load corpus")
    }

    /// Build and persist the index with `embedder`.
    pub async fn build(&self, embedder: Arc<MockEmbedder>, workers: usize) -> BuildReport {
        self.try_build(embedder, workers)
            .await
            .expect("Failed to build index")
    }

    /// Build and persist the index, returning any error.
    pub async fn try_build(
        &self,
        embedder: Arc<MockEmbedder>,
        workers: usize,
    ) -> Result<BuildReport, roster_indexing::IndexingError> {
        let builder = IndexBuilder::new(
            embedder,
            BuildConfig::new(TEST_DIMENSION).with_workers(workers),
        );
        rebuild_index(&builder, self.records(), &self.index_dir, &NoOpProgressCallback).await
    }

    /// Open a query engine on the persisted index.
    pub fn engine(&self, embedder: Arc<MockEmbedder>) -> QueryEngine<MockEmbedder> {
        QueryEngine::open(embedder, &self.index_dir, QueryConfig::default())
            .expect("Failed to open index")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A small sheet export: three groups and three users, plus a blank
/// trailing row in each sheet.
pub fn sample_corpus() -> serde_json::Value {
    json!({
        "groups": [
            {
                "Group ID": 101,
                "Group Name": "District Health Office",
                "Description": "Public health administration for the district",
                "Level": "District",
                "AlternateName1": "DHO",
                "AlternateName2": "Health Dept"
            },
            {
                "Group ID": 102,
                "Group Name": "Block Education Office",
                "Description": "Schools and staff postings for the block",
                "Level": "Block"
            },
            {
                "Group ID": 103,
                "Group Name": "State Water Board",
                "Description": "Water supply and sanitation",
                "Level": "State",
                "AlternateName1": "SWB"
            },
            {
                "Group ID": null,
                "Group Name": "  ",
                "Level": null
            }
        ],
        "users": [
            {
                "User name": "ANITA RAO",
                "Designation": "Block Development Officer",
                "Hierarchy": "Block",
                "Level": 4,
                "Appsavy ID": 5001
            },
            {
                "User name": "Anita Roy",
                "Designation": "Block Development Officer",
                "Hierarchy": "Block",
                "Level": 4,
                "Appsavy ID": 5002
            },
            {
                "User name": "ravi kumar",
                "Designation": "District Collector",
                "Hierarchy": "District",
                "Level": 2,
                "Appsavy ID": "5003"
            },
            {}
        ]
    })
}

/// Fixed placement of every sample record in a 4-dimensional space.
///
/// The two "Anita" users sit 0.01 apart (squared distance 0.0001) so any
/// query near them is ambiguous; everything else is well separated.
pub fn placements() -> Vec<(&'static str, Vec<f32>)> {
    vec![
        ("group_101", vec![1.0, 0.0, 0.0, 0.0]),
        ("group_102", vec![0.0, 1.0, 0.0, 0.0]),
        ("group_103", vec![0.0, 0.0, 1.0, 0.0]),
        ("user_5001", vec![0.0, 0.0, 0.0, 1.0]),
        ("user_5002", vec![0.0, 0.0, 0.0, 1.01]),
        ("user_5003", vec![2.0, 2.0, 0.0, 0.0]),
    ]
}

/// Mock embedder that maps every sample record's content to its placement.
pub fn placed_embedder(records: &[Record]) -> MockEmbedder {
    let placements = placements();
    let mut embedder = MockEmbedder::new(TEST_DIMENSION);
    for record in records {
        if let Some((_, vector)) = placements.iter().find(|(id, _)| *id == record.id) {
            embedder = embedder.with_vector(record.content.clone(), vector.clone());
        }
    }
    embedder
}

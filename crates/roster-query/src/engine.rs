//! Query engine.
//!
//! Embeds query text, searches the store and applies the disambiguation
//! policy. The store is read-only and shared; one engine can serve any number
//! of queries.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use roster_embeddings::EmbeddingModel;
use roster_types::QuerySettings;
use roster_vector::IndexStore;

use crate::disambiguation::{disambiguate, Candidate, Resolution, DEFAULT_TIE_THRESHOLD};
use crate::error::QueryError;

/// Query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Number of nearest neighbors to consider
    pub top_k: usize,
    /// Top-two distance gap below which the result is ambiguous
    pub tie_threshold: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            tie_threshold: DEFAULT_TIE_THRESHOLD,
        }
    }
}

impl QueryConfig {
    pub fn from_settings(settings: &QuerySettings) -> Self {
        Self {
            top_k: settings.top_k,
            tie_threshold: settings.tie_threshold,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_tie_threshold(mut self, tie_threshold: f32) -> Self {
        self.tie_threshold = tie_threshold;
        self
    }
}

/// Answers queries against one [`IndexStore`].
pub struct QueryEngine<E: EmbeddingModel> {
    embedder: Arc<E>,
    store: Arc<IndexStore>,
    config: QueryConfig,
}

impl<E: EmbeddingModel> QueryEngine<E> {
    pub fn new(embedder: Arc<E>, store: Arc<IndexStore>, config: QueryConfig) -> Self {
        let info = embedder.info();
        if info.name != store.model() {
            warn!(
                index_model = %store.model(),
                query_model = %info.name,
                "Query model differs from the model the index was built with"
            );
        }
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Load the artifact in `dir` and serve queries from it.
    pub fn open(
        embedder: Arc<E>,
        dir: impl AsRef<Path>,
        config: QueryConfig,
    ) -> Result<Self, QueryError> {
        let (store, manifest) = IndexStore::load(dir)?;
        info!(
            build_id = %manifest.build_id,
            records = store.len(),
            "Query engine ready"
        );
        Ok(Self::new(embedder, Arc::new(store), config))
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Nearest candidates for `query` using the configured `top_k`.
    pub fn search(&self, query: &str) -> Result<Vec<Candidate>, QueryError> {
        self.search_top_k(query, self.config.top_k)
    }

    /// Up to `top_k` candidates for `query`, by ascending distance, ties by
    /// position.
    pub fn search_top_k(&self, query: &str, top_k: usize) -> Result<Vec<Candidate>, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::InvalidInput("query is empty".to_string()));
        }
        if top_k == 0 {
            return Err(QueryError::InvalidInput("top_k must be at least 1".to_string()));
        }

        let embedding = self.embedder.embed(query)?;
        embedding.check_dimension(self.store.dimension())?;

        let candidates: Vec<Candidate> = self
            .store
            .search(&embedding, top_k)?
            .into_iter()
            .map(|neighbor| Candidate {
                position: neighbor.position,
                distance: neighbor.distance,
                record: neighbor.record.clone(),
            })
            .collect();

        debug!(query, top_k, found = candidates.len(), "Search complete");
        Ok(candidates)
    }

    /// Search and apply the disambiguation policy.
    pub fn resolve(&self, query: &str) -> Result<Resolution, QueryError> {
        let candidates = self.search(query)?;
        Ok(disambiguate(candidates, self.config.tie_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_embeddings::{Embedding, MockEmbedder};
    use roster_types::{GroupProfile, Profile, Record, UserProfile};
    use tempfile::TempDir;

    use crate::view::Detail;

    fn group(id: &str, name: &str) -> Record {
        Record::new(
            format!("group_{}", id),
            format!("Group Name: {}. Level: State.", name),
            Profile::Group(GroupProfile {
                group_id: id.to_string(),
                name: name.to_string(),
                level: "State".to_string(),
                description: String::new(),
                alternate_names: vec![],
            }),
        )
    }

    fn user(id: &str, name: &str) -> Record {
        Record::new(
            format!("user_{}", id),
            format!("User Name: {}.", name),
            Profile::User(UserProfile {
                user_id: id.to_string(),
                name: name.to_string(),
                designation: "Clerk".to_string(),
                hierarchy: "Block".to_string(),
                level: "5".to_string(),
            }),
        )
    }

    /// Store with points on a line: a at 0.0, b at 1.0, c at 1.1, d at 3.0.
    fn line_store() -> Arc<IndexStore> {
        let mut store = IndexStore::new(2, "mock-embedder");
        store.push(&Embedding::new(vec![0.0, 0.0]), group("a", "alpha")).unwrap();
        store.push(&Embedding::new(vec![1.0, 0.0]), user("b", "bravo")).unwrap();
        store.push(&Embedding::new(vec![1.1, 0.0]), user("c", "charlie")).unwrap();
        store.push(&Embedding::new(vec![3.0, 0.0]), group("d", "delta")).unwrap();
        Arc::new(store)
    }

    fn engine(embedder: MockEmbedder) -> QueryEngine<MockEmbedder> {
        QueryEngine::new(Arc::new(embedder), line_store(), QueryConfig::default())
    }

    #[test]
    fn test_single_match() {
        let engine = engine(MockEmbedder::new(2).with_vector("alpha", vec![0.0, 0.0]));
        let resolution = engine.resolve("alpha").unwrap();
        let detail = resolution.into_detail(None).unwrap();
        assert!(matches!(detail, Detail::Group { ref name, .. } if name == "Alpha"));
    }

    #[test]
    fn test_query_is_trimmed() {
        let embedder = MockEmbedder::new(2).with_vector("alpha", vec![0.0, 0.0]);
        let engine = engine(embedder);
        let candidates = engine.search("  alpha \n").unwrap();
        assert_eq!(candidates[0].record.id, "group_a");
        assert_eq!(candidates[0].distance, 0.0);
    }

    #[test]
    fn test_ambiguous_match() {
        // Distances to (1.05, 0): b 0.0025, c 0.0025, a 1.1025.
        let engine = engine(MockEmbedder::new(2).with_vector("b or c", vec![1.05, 0.0]));
        let Resolution::Ambiguous(choice) = engine.resolve("b or c").unwrap() else {
            panic!("expected an ambiguous resolution");
        };

        let ids: Vec<&str> = choice.candidates().iter().map(|c| c.record.id.as_str()).collect();
        assert_eq!(ids, vec!["user_b", "user_c", "group_a"]);

        let chosen = choice.select("2").unwrap();
        assert_eq!(chosen.record.id, "user_c");
    }

    #[test]
    fn test_top_k_limits_candidates() {
        let engine = engine(MockEmbedder::new(2).with_vector("q", vec![0.0, 0.0]));
        assert_eq!(engine.search("q").unwrap().len(), 3);
        assert_eq!(engine.search_top_k("q", 10).unwrap().len(), 4);
        assert_eq!(engine.search_top_k("q", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_index_is_no_match() {
        let engine = QueryEngine::new(
            Arc::new(MockEmbedder::new(2)),
            Arc::new(IndexStore::new(2, "mock-embedder")),
            QueryConfig::default(),
        );
        assert_eq!(engine.resolve("anything").unwrap(), Resolution::NoMatch);
    }

    #[test]
    fn test_invalid_input() {
        let engine = engine(MockEmbedder::new(2));
        assert!(matches!(engine.search("   "), Err(QueryError::InvalidInput(_))));
        assert!(matches!(
            engine.search_top_k("alpha", 0),
            Err(QueryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wrong_query_dimension() {
        let store = Arc::new(IndexStore::new(768, "mock-embedder"));
        let embedder = MockEmbedder::new(768).with_vector("short", vec![0.1; 700]);
        let engine = QueryEngine::new(Arc::new(embedder), store, QueryConfig::default());

        assert!(matches!(
            engine.resolve("short"),
            Err(QueryError::DimensionMismatch {
                expected: 768,
                actual: 700
            })
        ));
    }

    #[test]
    fn test_provider_failure_surfaces() {
        let engine = engine(MockEmbedder::new(2).failing_on("boom", 503));
        assert!(matches!(engine.resolve("boom"), Err(QueryError::Embedding(_))));
    }

    #[test]
    fn test_open_from_artifact() {
        let temp = TempDir::new().unwrap();
        line_store().save(temp.path()).unwrap();

        let engine = QueryEngine::open(
            Arc::new(MockEmbedder::new(2).with_vector("delta", vec![3.0, 0.0])),
            temp.path(),
            QueryConfig::default().with_top_k(2),
        )
        .unwrap();
        let candidates = engine.search("delta").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].record.id, "group_d");
    }

    #[test]
    fn test_open_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let result = QueryEngine::open(
            Arc::new(MockEmbedder::new(2)),
            temp.path(),
            QueryConfig::default(),
        );
        assert!(matches!(result, Err(QueryError::Vector(_))));
    }
}

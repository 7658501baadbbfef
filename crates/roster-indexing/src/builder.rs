//! Index builder.
//!
//! Embeds every record and fills an [`IndexStore`] with `(vector, record)`
//! pairs in record order. Embedding calls are blocking and may run on up to
//! `workers` blocking threads at once; their results are put back into record
//! order before anything is appended, so concurrency never changes positions.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use roster_embeddings::{Embedding, EmbeddingModel};
use roster_types::{validate_records, BuildSettings, Record};
use roster_vector::IndexStore;

use crate::error::IndexingError;
use crate::progress::{BuildProgress, NoOpProgressCallback, ProgressCallback};

/// Configuration for an index build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Maximum concurrent embedding calls.
    pub workers: usize,
    /// Length every embedding must have.
    pub dimension: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            dimension: 768,
        }
    }
}

impl BuildConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    pub fn from_settings(build: &BuildSettings, dimension: usize) -> Self {
        Self {
            workers: build.workers,
            dimension,
        }
    }

    /// Set the worker count. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Builds an [`IndexStore`] from records using an embedding model.
pub struct IndexBuilder<E: EmbeddingModel> {
    embedder: Arc<E>,
    config: BuildConfig,
}

impl<E: EmbeddingModel + 'static> IndexBuilder<E> {
    pub fn new(embedder: Arc<E>, config: BuildConfig) -> Self {
        Self { embedder, config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn embedder(&self) -> &Arc<E> {
        &self.embedder
    }

    /// Embed all records and return the populated store.
    ///
    /// The first failure of any kind aborts the build; no partial store is
    /// returned.
    pub async fn build(&self, records: Vec<Record>) -> Result<IndexStore, IndexingError> {
        self.build_with_progress(records, &NoOpProgressCallback).await
    }

    /// Like [`IndexBuilder::build`], reporting each embedded record to `progress`.
    pub async fn build_with_progress(
        &self,
        records: Vec<Record>,
        progress: &dyn ProgressCallback,
    ) -> Result<IndexStore, IndexingError> {
        validate_records(&records)?;

        let start = Instant::now();
        let total = records.len();
        let model = self.embedder.info().name.clone();
        info!(
            records = total,
            dimension = self.config.dimension,
            workers = self.config.workers,
            model = %model,
            "Starting index build"
        );

        let embeddings = self.embed_all(&records, progress).await?;

        let mut store = IndexStore::new(self.config.dimension, model);
        for (embedding, record) in embeddings.iter().zip(records) {
            store.push(embedding, record)?;
        }

        info!(
            records = store.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Index build complete"
        );
        Ok(store)
    }

    /// Embed every record's content, returning embeddings in record order.
    async fn embed_all(
        &self,
        records: &[Record],
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<Embedding>, IndexingError> {
        let total = records.len();
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<Embedding>> = (0..total).map(|_| None).collect();
        let mut state = BuildProgress::new(total);

        for (position, record) in records.iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| IndexingError::Task(e.to_string()))?;

            let embedder = Arc::clone(&self.embedder);
            let content = record.content.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (position, embedder.embed(&content))
            });

            // Stop spawning as soon as anything already failed.
            while let Some(joined) = tasks.try_join_next() {
                self.accept(joined?, records, &mut slots, &mut state, progress)?;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            self.accept(joined?, records, &mut slots, &mut state, progress)?;
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.ok_or_else(|| {
                    IndexingError::Task(format!("no embedding produced for position {}", position))
                })
            })
            .collect()
    }

    fn accept(
        &self,
        (position, result): (usize, Result<Embedding, roster_embeddings::EmbeddingError>),
        records: &[Record],
        slots: &mut [Option<Embedding>],
        state: &mut BuildProgress,
        progress: &dyn ProgressCallback,
    ) -> Result<(), IndexingError> {
        let id = &records[position].id;

        let embedding = result
            .and_then(|embedding| {
                embedding.check_dimension(self.config.dimension)?;
                Ok(embedding)
            })
            .map_err(|e| {
                warn!(id = %id, position, error = %e, "Embedding failed, aborting build");
                IndexingError::from(e)
            })?;

        debug!(id = %id, position, "Embedded record");
        slots[position] = Some(embedding);
        state.record_embedded();
        progress.on_progress(state);
        Ok(())
    }
}

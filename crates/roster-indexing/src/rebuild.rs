//! Build-and-persist.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::info;

use roster_embeddings::EmbeddingModel;
use roster_types::Record;

use crate::builder::IndexBuilder;
use crate::error::IndexingError;
use crate::progress::ProgressCallback;

/// Summary of a completed, persisted build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub records_indexed: usize,
    pub dimension: usize,
    /// Build id written into both artifact files.
    pub build_id: String,
    pub model: String,
    pub built_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Build an index from `records` and persist it as the artifact in `dir`.
///
/// Nothing is written unless the build succeeds. An artifact already in `dir`
/// is replaced only once the new files are complete.
pub async fn rebuild_index<E: EmbeddingModel + 'static>(
    builder: &IndexBuilder<E>,
    records: Vec<Record>,
    dir: impl AsRef<Path>,
    progress: &dyn ProgressCallback,
) -> Result<BuildReport, IndexingError> {
    let dir = dir.as_ref();
    let start = Instant::now();

    let store = builder.build_with_progress(records, progress).await?;
    let manifest = store.save(dir)?;

    let report = BuildReport {
        records_indexed: manifest.count,
        dimension: manifest.dimension,
        build_id: manifest.build_id,
        model: manifest.model,
        built_at: manifest.built_at,
        elapsed: start.elapsed(),
    };

    info!(
        path = ?dir,
        records = report.records_indexed,
        build_id = %report.build_id,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Rebuild complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::BuildConfig;
    use crate::progress::NoOpProgressCallback;
    use roster_embeddings::MockEmbedder;
    use roster_types::{Profile, UserProfile};
    use roster_vector::{IndexStore, RECORDS_FILE, VECTORS_FILE};
    use tempfile::TempDir;

    fn user(id: &str, name: &str) -> Record {
        Record::new(
            format!("user_{}", id),
            format!("User Name: {}. Designation: Clerk.", name),
            Profile::User(UserProfile {
                user_id: id.to_string(),
                name: name.to_string(),
                designation: "Clerk".to_string(),
                hierarchy: "Block".to_string(),
                level: "4".to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn test_rebuild_persists_loadable_artifact() {
        let temp = TempDir::new().unwrap();
        let builder = IndexBuilder::new(Arc::new(MockEmbedder::new(8)), BuildConfig::new(8));
        let records = vec![user("1", "Asha"), user("2", "Ravi")];

        let report = rebuild_index(&builder, records.clone(), temp.path(), &NoOpProgressCallback)
            .await
            .unwrap();
        assert_eq!(report.records_indexed, 2);
        assert_eq!(report.dimension, 8);
        assert_eq!(report.model, "mock-embedder");

        let (store, manifest) = IndexStore::load(temp.path()).unwrap();
        assert_eq!(manifest.build_id, report.build_id);
        assert_eq!(store.records(), records.as_slice());
    }

    #[tokio::test]
    async fn test_failed_build_leaves_no_artifact() {
        let temp = TempDir::new().unwrap();
        let embedder = MockEmbedder::new(8).failing_on(&user("2", "Ravi").content, 500);
        let builder = IndexBuilder::new(Arc::new(embedder), BuildConfig::new(8));

        let result = rebuild_index(
            &builder,
            vec![user("1", "Asha"), user("2", "Ravi")],
            temp.path(),
            &NoOpProgressCallback,
        )
        .await;
        assert!(result.is_err());
        assert!(!temp.path().join(VECTORS_FILE).exists());
        assert!(!temp.path().join(RECORDS_FILE).exists());
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_artifact() {
        let temp = TempDir::new().unwrap();
        let good = IndexBuilder::new(Arc::new(MockEmbedder::new(8)), BuildConfig::new(8));
        let first = rebuild_index(&good, vec![user("1", "Asha")], temp.path(), &NoOpProgressCallback)
            .await
            .unwrap();

        let bad = IndexBuilder::new(
            Arc::new(MockEmbedder::new(8).with_vector(&user("2", "Ravi").content, vec![0.0; 3])),
            BuildConfig::new(8),
        );
        let err = rebuild_index(&bad, vec![user("2", "Ravi")], temp.path(), &NoOpProgressCallback)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexingError::DimensionMismatch { expected: 8, actual: 3 }));

        let (_, manifest) = IndexStore::load(temp.path()).unwrap();
        assert_eq!(manifest.build_id, first.build_id);
    }
}

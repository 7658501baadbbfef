//! Error path E2E tests.
//!
//! Wrong vector lengths, provider failures and damaged artifacts must surface
//! as typed errors, and a failed build must never leave an artifact behind.

use std::fs;
use std::sync::Arc;

use e2e_tests::{placed_embedder, TestHarness, TEST_DIMENSION};
use roster_embeddings::MockEmbedder;
use roster_indexing::IndexingError;
use roster_query::{QueryConfig, QueryEngine, QueryError};
use roster_vector::{VectorError, RECORDS_FILE, VECTORS_FILE};

#[tokio::test]
async fn test_wrong_length_aborts_build() {
    let harness = TestHarness::new();
    let records = harness.records();
    let embedder =
        placed_embedder(&records).with_vector(records[5].content.clone(), vec![0.0; 3]);

    let err = harness.try_build(Arc::new(embedder), 2).await.unwrap_err();
    assert!(matches!(
        err,
        IndexingError::DimensionMismatch {
            expected: TEST_DIMENSION,
            actual: 3
        }
    ));
    assert!(!harness.index_dir.join(VECTORS_FILE).exists());
    assert!(!harness.index_dir.join(RECORDS_FILE).exists());
}

#[tokio::test]
async fn test_provider_failure_aborts_build() {
    let harness = TestHarness::new();
    let records = harness.records();
    let embedder = MockEmbedder::new(TEST_DIMENSION).failing_on(records[1].content.clone(), 503);

    let err = harness.try_build(Arc::new(embedder), 2).await.unwrap_err();
    assert!(matches!(err, IndexingError::Embedding(_)));
    assert!(!harness.index_dir.join(VECTORS_FILE).exists());
}

#[tokio::test]
async fn test_wrong_length_query() {
    let harness = TestHarness::new();
    let records = harness.records();
    harness
        .build(Arc::new(placed_embedder(&records)), 2)
        .await;

    let embedder = placed_embedder(&records).with_vector("short", vec![0.0; 700]);
    let result = harness.engine(Arc::new(embedder)).resolve("short");
    assert!(matches!(
        result,
        Err(QueryError::DimensionMismatch {
            expected: TEST_DIMENSION,
            actual: 700
        })
    ));
}

#[tokio::test]
async fn test_mixed_build_artifact_is_corruption() {
    let first = TestHarness::new();
    let second = TestHarness::new();
    let embedder = Arc::new(placed_embedder(&first.records()));
    first.build(Arc::clone(&embedder), 2).await;
    second.build(Arc::clone(&embedder), 2).await;

    fs::copy(
        second.index_dir.join(VECTORS_FILE),
        first.index_dir.join(VECTORS_FILE),
    )
    .unwrap();

    let result = QueryEngine::open(embedder, &first.index_dir, QueryConfig::default());
    assert!(matches!(result, Err(QueryError::IndexCorruption(_))));
}

#[tokio::test]
async fn test_truncated_artifact_is_corruption() {
    let harness = TestHarness::new();
    let embedder = Arc::new(placed_embedder(&harness.records()));
    harness.build(Arc::clone(&embedder), 2).await;

    let path = harness.index_dir.join(VECTORS_FILE);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

    let result = QueryEngine::open(embedder, &harness.index_dir, QueryConfig::default());
    assert!(matches!(result, Err(QueryError::IndexCorruption(_))));
}

#[tokio::test]
async fn test_missing_records_file_is_corruption() {
    let harness = TestHarness::new();
    let embedder = Arc::new(placed_embedder(&harness.records()));
    harness.build(Arc::clone(&embedder), 2).await;
    fs::remove_file(harness.index_dir.join(RECORDS_FILE)).unwrap();

    let result = QueryEngine::open(embedder, &harness.index_dir, QueryConfig::default());
    assert!(matches!(result, Err(QueryError::IndexCorruption(_))));
}

#[tokio::test]
async fn test_missing_index_is_not_found() {
    let harness = TestHarness::new();
    let result = QueryEngine::open(
        Arc::new(MockEmbedder::new(TEST_DIMENSION)),
        &harness.index_dir,
        QueryConfig::default(),
    );
    assert!(matches!(
        result,
        Err(QueryError::Vector(VectorError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_blank_query_is_invalid_input() {
    let harness = TestHarness::new();
    let embedder = Arc::new(placed_embedder(&harness.records()));
    harness.build(Arc::clone(&embedder), 2).await;

    let result = harness.engine(embedder).resolve("   ");
    assert!(matches!(result, Err(QueryError::InvalidInput(_))));
}

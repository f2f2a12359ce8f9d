//! End-to-end pipeline tests using the deterministic test doubles.

mod common;

use std::sync::Arc;

use common::HashEmbedder;
use docqa_rag::{
    FlatStore, GenerationOptions, LexicalStore, Metadata, MockGenerator, QaError, QaPipeline,
    SentenceChunker, StoreStats,
};
use serde_json::json;

fn flat_pipeline(dir: &tempfile::TempDir) -> QaPipeline {
    QaPipeline::builder()
        .chunker(SentenceChunker::new(1000, 200))
        .store(Arc::new(FlatStore::open(
            dir.path(),
            "api_documentation",
            Arc::new(HashEmbedder::new(32)),
        )))
        .generator(Arc::new(MockGenerator::new()))
        .top_k(5)
        .build()
        .unwrap()
}

#[tokio::test]
async fn end_to_end_upload_then_ask_cites_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = flat_pipeline(&dir);

    let receipt = pipeline
        .ingest(
            "Authentication: use a Bearer token in the Authorization header.",
            Some("d1"),
            &Metadata::new(),
        )
        .await
        .unwrap();
    assert_eq!(receipt.chunks_created, 1);
    assert_eq!(receipt.doc_id.as_deref(), Some("d1"));

    let answer = pipeline
        .ask("How do I authenticate?", GenerationOptions::default())
        .await
        .unwrap()
        .expect("expected an answer");

    assert_eq!(answer.question, "How do I authenticate?");
    assert_eq!(answer.model_used, "mock-gpt-4");
    assert!(answer.tokens_used.unwrap() > 0);
    assert!(!answer.sources.is_empty());
    assert!(answer.sources.iter().any(|s| s.metadata.get("doc_id") == Some(&json!("d1"))));
}

#[tokio::test]
async fn ask_on_empty_index_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = flat_pipeline(&dir);

    let answer =
        pipeline.ask("How do I authenticate?", GenerationOptions::default()).await.unwrap();
    assert!(answer.is_none());
}

#[tokio::test]
async fn empty_content_is_rejected_before_indexing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = flat_pipeline(&dir);

    let result = pipeline.ingest("   \n\n  ", Some("d1"), &Metadata::new()).await;
    assert!(matches!(result, Err(QaError::Validation(_))));

    match pipeline.stats().await {
        StoreStats::Ready { total_documents, .. } => assert_eq!(total_documents, 0),
        StoreStats::Error { error } => panic!("stats failed: {error}"),
    }
}

#[tokio::test]
async fn long_documents_split_into_multiple_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = QaPipeline::builder()
        .chunker(SentenceChunker::new(80, 20))
        .store(Arc::new(LexicalStore::open(dir.path(), "api_documentation")))
        .generator(Arc::new(MockGenerator::new()))
        .build()
        .unwrap();

    let content = "Authentication uses Bearer tokens. Rate limits apply per key. \
                   Webhooks deliver events asynchronously. Pagination uses cursors. \
                   Errors follow RFC 7807 problem details. Retries use backoff.";
    let receipt = pipeline.ingest(content, Some("guide"), &Metadata::new()).await.unwrap();
    assert!(receipt.chunks_created >= 2);

    let sources = pipeline.retrieve("rate limits", 3).await.unwrap();
    assert!(!sources.is_empty());
    // Positional metadata rides along with every chunk.
    assert!(sources[0].metadata.contains_key("chunk_index"));
    assert_eq!(
        sources[0].metadata.get("total_chunks"),
        Some(&json!(receipt.chunks_created))
    );
}

#[tokio::test]
async fn extra_metadata_flows_through_to_sources() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = flat_pipeline(&dir);

    let mut extra = Metadata::new();
    extra.insert("source".to_string(), json!("manual"));
    pipeline
        .ingest("Webhooks deliver events asynchronously.", Some("hooks"), &extra)
        .await
        .unwrap();

    let sources = pipeline.retrieve("webhooks events", 1).await.unwrap();
    assert_eq!(sources[0].metadata.get("source"), Some(&json!("manual")));
    assert_eq!(sources[0].metadata.get("doc_id"), Some(&json!("hooks")));
}

#[tokio::test]
async fn relevance_scores_are_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = flat_pipeline(&dir);

    pipeline
        .ingest("Bearer token required for all endpoints.", Some("d1"), &Metadata::new())
        .await
        .unwrap();

    let sources = pipeline.retrieve("Bearer token", 1).await.unwrap();
    assert_eq!(sources.len(), 1);
    assert!((0.0..=1.0).contains(&sources[0].relevance_score));
}

#[tokio::test]
async fn health_reports_both_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = flat_pipeline(&dir);

    let health = pipeline.health().await;
    assert!(health.vector_store);
    assert!(health.llm);
}

#[tokio::test]
async fn delete_through_pipeline_removes_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = flat_pipeline(&dir);

    pipeline.ingest("Bearer token required.", Some("d1"), &Metadata::new()).await.unwrap();
    pipeline.delete_document("d1_chunk_0").await.unwrap();

    let answer =
        pipeline.ask("How do I authenticate?", GenerationOptions::default()).await.unwrap();
    assert!(answer.is_none());
}

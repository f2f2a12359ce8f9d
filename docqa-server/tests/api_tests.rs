//! Router-level tests exercising the full HTTP surface with the
//! deterministic mock generator and the lexical store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use docqa_rag::{LexicalStore, MockGenerator, QaPipeline, SentenceChunker};
use docqa_server::{AppState, app_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_app(dir: &tempfile::TempDir) -> Router {
    let pipeline = QaPipeline::builder()
        .chunker(SentenceChunker::new(1000, 200))
        .store(Arc::new(LexicalStore::open(dir.path(), "api_documentation")))
        .generator(Arc::new(MockGenerator::new()))
        .top_k(5)
        .build()
        .unwrap();

    app_router(AppState {
        pipeline: Arc::new(pipeline),
        app_name: "DocQA".to_string(),
        app_version: "0.1.0".to_string(),
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_then_ask_returns_answer_with_sources() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let upload = post_json(
        "/api/v1/documents",
        json!({
            "content": "Authentication: use a Bearer token in the Authorization header.",
            "doc_id": "d1"
        }),
    );
    let response = app.clone().oneshot(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["chunks_created"], json!(1));
    assert_eq!(body["doc_id"], json!("d1"));

    let ask = post_json("/api/v1/ask", json!({"question": "How do I authenticate?"}));
    let response = app.oneshot(ask).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["question"], json!("How do I authenticate?"));
    assert_eq!(body["model_used"], json!("mock-gpt-4"));
    assert!(body["answer"].as_str().unwrap().contains("Bearer token"));
    let sources = body["sources"].as_array().unwrap();
    assert!(!sources.is_empty());
    assert!(sources.iter().any(|s| s["metadata"]["doc_id"] == json!("d1")));
    for source in sources {
        let score = source["relevance_score"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
    }
}

#[tokio::test]
async fn short_question_is_rejected_with_422() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let response =
        app.oneshot(post_json("/api/v1/ask", json!({"question": "Hi?"}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("Validation failed"));
}

#[tokio::test]
async fn out_of_range_temperature_is_rejected_with_422() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let request = post_json(
        "/api/v1/ask",
        json!({"question": "How do I authenticate?", "temperature": 3.0}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn ask_without_documents_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let response = app
        .oneshot(post_json("/api/v1/ask", json!({"question": "How do I authenticate?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_content_upload_is_rejected_with_422() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let response = app
        .oneshot(post_json("/api/v1/documents", json!({"content": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn health_reports_component_status() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let request = Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["vector_store_status"], json!("healthy"));
    assert_eq!(body["llm_status"], json!("healthy"));
}

#[tokio::test]
async fn stats_reflects_uploaded_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let upload = post_json(
        "/api/v1/documents",
        json!({"content": "Webhooks deliver events asynchronously.", "doc_id": "hooks"}),
    );
    let response = app.clone().oneshot(upload).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = Request::builder().uri("/api/v1/stats").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_documents"], json!(1));
    assert_eq!(body["collection_name"], json!("api_documentation"));
}

#[tokio::test]
async fn root_serves_the_service_card() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(&dir);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], json!("DocQA"));
    assert_eq!(body["health"], json!("/api/v1/health"));
}

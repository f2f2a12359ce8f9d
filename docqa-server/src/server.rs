//! HTTP layer: router, handlers, and error mapping.
//!
//! Thin glue around [`QaPipeline`]: request validation, serialization,
//! and status-code mapping. Everything with algorithmic content lives in
//! `docqa-rag`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use docqa_rag::{GenerationOptions, QaError, QaPipeline};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::types::{
    AnswerResponse, DocumentUpload, ErrorBody, HealthResponse, QuestionRequest, UploadResponse,
};

/// Minimum accepted question length, in characters.
const MIN_QUESTION_CHARS: usize = 5;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QaPipeline>,
    pub app_name: String,
    pub app_version: String,
}

/// Bind address configuration for [`run_server`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8000 }
    }
}

/// Errors a handler can surface, each carrying its status code.
enum ApiError {
    Validation(String),
    NotFound(String),
    Internal(String),
}

impl From<QaError> for ApiError {
    fn from(e: QaError) -> Self {
        match e {
            QaError::Validation(message) => Self::Validation(message),
            // Provider, persistence and orchestration failures all surface
            // as a generic service failure.
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, detail) = match self {
            Self::Validation(detail) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation failed", Some(detail))
            }
            Self::NotFound(detail) => (StatusCode::NOT_FOUND, "Not found", Some(detail)),
            Self::Internal(detail) => {
                error!(detail = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", Some(detail))
            }
        };
        (status, Json(ErrorBody::new(error, detail))).into_response()
    }
}

/// Build the application router with tracing, CORS and timeout layers.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/v1/documents", post(upload_document))
        .route("/api/v1/ask", post(ask_question))
        .route("/api/v1/health", get(health))
        .route("/api/v1/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app_router(state)).await?;
    Ok(())
}

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.app_name,
        "version": state.app_version,
        "health": "/api/v1/health",
    }))
}

/// `POST /api/v1/documents` — chunk and index documentation content.
async fn upload_document(
    State(state): State<AppState>,
    Json(upload): Json<DocumentUpload>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    if upload.content.trim().is_empty() {
        return Err(ApiError::Validation("content must not be empty".to_string()));
    }

    let receipt = state
        .pipeline
        .ingest(&upload.content, upload.doc_id.as_deref(), &upload.metadata)
        .await?;

    info!(doc_id = ?receipt.doc_id, chunks = receipt.chunks_created, "document uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Document uploaded successfully".to_string(),
            chunks_created: receipt.chunks_created,
            doc_id: receipt.doc_id,
        }),
    ))
}

/// `POST /api/v1/ask` — retrieve context and generate an answer.
async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    if request.question.chars().count() < MIN_QUESTION_CHARS {
        return Err(ApiError::Validation(format!(
            "question must be at least {MIN_QUESTION_CHARS} characters"
        )));
    }
    if let Some(temperature) = request.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ApiError::Validation(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
    }

    let opts =
        GenerationOptions { max_tokens: request.max_tokens, temperature: request.temperature };

    let answer = state.pipeline.ask(&request.question, opts).await?.ok_or_else(|| {
        ApiError::NotFound(
            "No relevant documentation found. Please upload documents first.".to_string(),
        )
    })?;

    Ok(Json(AnswerResponse {
        question: answer.question,
        answer: answer.answer,
        sources: answer.sources,
        timestamp: Utc::now(),
        model_used: answer.model_used,
        tokens_used: answer.tokens_used,
    }))
}

/// `GET /api/v1/health` — probe the store and the generator.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let probe = state.pipeline.health().await;
    let status = if probe.vector_store && probe.llm { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        version: state.app_version.clone(),
        vector_store_status: if probe.vector_store { "healthy" } else { "unhealthy" }.to_string(),
        llm_status: if probe.llm { "healthy" } else { "unhealthy" }.to_string(),
    })
}

/// `GET /api/v1/stats` — collection statistics, error-shaped on failure.
async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.pipeline.stats().await)
}

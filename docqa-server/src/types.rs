//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use docqa_rag::{Metadata, ScoredSource};
use serde::{Deserialize, Serialize};

/// Body for `POST /api/v1/documents`.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentUpload {
    /// The documentation content to index.
    pub content: String,
    /// Additional metadata attached to every chunk.
    #[serde(default)]
    pub metadata: Metadata,
    /// Unique document identifier.
    #[serde(default)]
    pub doc_id: Option<String>,
}

/// Body for `POST /api/v1/ask`.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    /// The question to ask. Must be at least 5 characters.
    pub question: String,
    /// Maximum tokens in the generated answer.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature, in `[0, 2]`.
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Response for a successful document upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub chunks_created: usize,
    pub doc_id: Option<String>,
}

/// Response for a successfully answered question.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<ScoredSource>,
    pub timestamp: DateTime<Utc>,
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// Response for `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub vector_store_status: String,
    pub llm_status: String,
}

/// Error body returned for every non-success response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, detail: Option<String>) -> Self {
        Self { error: error.into(), detail, timestamp: Utc::now() }
    }
}

//! OpenAI-backed embedding and generation providers.
//!
//! Both providers call the OpenAI REST API directly through `reqwest`
//! with a bounded request timeout, so one stalled provider call cannot
//! hold a request slot indefinitely.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::generation::{AnswerGenerator, Generation, GenerationOptions};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// The default embedding model and its dimensionality.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// The default chat model for answer generation.
const DEFAULT_CHAT_MODEL: &str = "gpt-4";

const SYSTEM_PROMPT: &str = "You are an expert API documentation assistant. Your role is to help developers understand and use APIs effectively.

When answering questions:
1. Be precise and technical when needed
2. Provide code examples when relevant
3. Reference the specific documentation sections you're using
4. If the documentation doesn't contain the answer, clearly state that
5. Be concise but thorough

Always base your answers on the provided documentation context.";

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QaError::Config(format!("failed to build HTTP client: {e}")))
}

fn require_key(api_key: &str) -> Result<()> {
    if api_key.is_empty() {
        return Err(QaError::Config("OpenAI API key must not be empty".into()));
    }
    Ok(())
}

/// Decode an OpenAI error body into its message, falling back to the raw
/// body text.
fn error_detail(body: String) -> String {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::OpenAiEmbeddingProvider;
///
/// let provider = OpenAiEmbeddingProvider::new("sk-...")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingProvider {
    /// Create a new provider with the given API key and the default model
    /// (`text-embedding-3-small`, 1536 dimensions).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        require_key(&api_key)?;
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            api_base: DEFAULT_API_BASE.into(),
            api_key,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        })
    }

    /// Set the model name and its output dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Override the API base URL (proxies, compatible servers, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| QaError::Embedding {
            provider: "OpenAI".into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest { model: &self.model, input: texts.to_vec() };

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding request failed");
                QaError::Embedding {
                    provider: "OpenAI".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(%status, "embedding API error");
            return Err(QaError::Embedding {
                provider: "OpenAI".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            QaError::Embedding {
                provider: "OpenAI".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// An [`AnswerGenerator`] backed by the OpenAI chat completions API.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    default_max_tokens: u32,
    default_temperature: f32,
}

impl OpenAiGenerator {
    /// Create a new generator with the given API key and the default
    /// chat model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        require_key(&api_key)?;
        Ok(Self {
            client: build_client(Duration::from_secs(60))?,
            api_base: DEFAULT_API_BASE.into(),
            api_key,
            model: DEFAULT_CHAT_MODEL.into(),
            default_max_tokens: 1000,
            default_temperature: 0.7,
        })
    }

    /// Set the chat model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the fallback generation knobs used when a request leaves them
    /// unset.
    pub fn with_defaults(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }

    /// Override the API base URL (proxies, compatible servers, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage<'_>>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Generation> {
        let request_body = ChatRequest { model: &self.model, messages, max_tokens, temperature };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "chat completion request failed");
                QaError::Generation {
                    provider: "OpenAI".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(%status, "chat completion API error");
            return Err(QaError::Generation {
                provider: "OpenAI".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            QaError::Generation {
                provider: "OpenAI".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let answer = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| QaError::Generation {
                provider: "OpenAI".into(),
                message: "API returned no choices".into(),
            })?;

        Ok(Generation { answer, tokens_used: chat_response.usage.map(|u| u.total_tokens) })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: std::borrow::Cow<'a, str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[async_trait]
impl AnswerGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        question: &str,
        context_docs: &[String],
        opts: GenerationOptions,
    ) -> Result<Generation> {
        let context = context_docs
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("Document {}:\n{doc}", i + 1))
            .collect::<Vec<_>>()
            .join("\n\n");

        let user_prompt = format!(
            "Based on the following API documentation, please answer the question.\n\n\
             Documentation Context:\n{context}\n\n\
             Question: {question}\n\n\
             Please provide a clear, accurate answer based on the documentation provided."
        );

        let messages = vec![
            ChatMessage { role: "system", content: SYSTEM_PROMPT.into() },
            ChatMessage { role: "user", content: user_prompt.into() },
        ];

        let generation = self
            .chat(
                messages,
                opts.max_tokens.unwrap_or(self.default_max_tokens),
                opts.temperature.unwrap_or(self.default_temperature),
            )
            .await?;

        debug!(tokens = ?generation.tokens_used, "generated answer");
        Ok(generation)
    }

    async fn health(&self) -> bool {
        // A minimal completion doubles as an auth + quota probe.
        let messages = vec![ChatMessage { role: "user", content: "test".into() }];
        match self.chat(messages, 5, 0.0).await {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "LLM health check failed");
                false
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

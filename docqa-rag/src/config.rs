//! Service configuration.
//!
//! [`Settings`] carries every tunable the pipeline and providers read.
//! Values come from `DOCQA_*` environment variables with defaults suitable
//! for local development; [`Settings::validate`] enforces the cross-field
//! constraints before anything is constructed from them.

use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// Which [`DocumentStore`](crate::DocumentStore) backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Managed vector database collection (Qdrant, `qdrant` feature).
    Qdrant,
    /// Sparse TF-IDF vectorizer, no embedding provider required.
    Lexical,
    /// Flat exact nearest-neighbor over dense embeddings.
    Flat,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "qdrant" => Ok(Self::Qdrant),
            "lexical" => Ok(Self::Lexical),
            "flat" => Ok(Self::Flat),
            other => Err(QaError::Config(format!(
                "unknown store backend '{other}' (expected qdrant, lexical or flat)"
            ))),
        }
    }
}

/// Application configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Service name reported on the root endpoint.
    pub app_name: String,
    /// Service version reported on the root endpoint and health checks.
    pub app_version: String,

    /// OpenAI API key. Required by the OpenAI providers only.
    pub openai_api_key: String,
    /// Chat model used for answer generation.
    pub openai_model: String,
    /// Embedding model used for indexing and queries.
    pub embedding_model: String,
    /// Dimensionality of the embedding model output.
    pub embedding_dimensions: usize,
    /// Default maximum tokens per generated answer.
    pub max_tokens: u32,
    /// Default sampling temperature.
    pub temperature: f32,
    /// Timeout applied to every provider HTTP call, in seconds.
    pub provider_timeout_secs: u64,
    /// Use the deterministic mock generator instead of a live model.
    pub use_mock_llm: bool,

    /// Which index backend to construct.
    pub store_backend: StoreBackend,
    /// Directory holding persisted index state.
    pub data_dir: String,
    /// Collection name reported in stats and used by the managed backend.
    pub collection_name: String,
    /// Qdrant gRPC URL (managed backend only).
    pub qdrant_url: String,

    /// Target chunk size in bytes.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in bytes.
    pub chunk_overlap: usize,
    /// Number of results retrieved per query.
    pub top_k: usize,

    /// Bind address for the HTTP server.
    pub host: String,
    /// Bind port for the HTTP server.
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "DocQA".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            openai_api_key: String::new(),
            openai_model: "gpt-4".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            max_tokens: 1000,
            temperature: 0.7,
            provider_timeout_secs: 30,
            use_mock_llm: false,
            store_backend: StoreBackend::Lexical,
            data_dir: "./vector_db".to_string(),
            collection_name: "api_documentation".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env_var(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| QaError::Config(format!("invalid value '{raw}' for {name}"))),
    }
}

impl Settings {
    /// Load settings from `DOCQA_*` environment variables, falling back to
    /// defaults, then validate.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Some(v) = env_var("DOCQA_OPENAI_API_KEY") {
            settings.openai_api_key = v;
        }
        if let Some(v) = env_var("DOCQA_OPENAI_MODEL") {
            settings.openai_model = v;
        }
        if let Some(v) = env_var("DOCQA_EMBEDDING_MODEL") {
            settings.embedding_model = v;
        }
        if let Some(v) = env_parsed("DOCQA_EMBEDDING_DIMENSIONS")? {
            settings.embedding_dimensions = v;
        }
        if let Some(v) = env_parsed("DOCQA_MAX_TOKENS")? {
            settings.max_tokens = v;
        }
        if let Some(v) = env_parsed("DOCQA_TEMPERATURE")? {
            settings.temperature = v;
        }
        if let Some(v) = env_parsed("DOCQA_PROVIDER_TIMEOUT_SECS")? {
            settings.provider_timeout_secs = v;
        }
        if let Some(v) = env_parsed("DOCQA_USE_MOCK_LLM")? {
            settings.use_mock_llm = v;
        }
        if let Some(v) = env_var("DOCQA_STORE_BACKEND") {
            settings.store_backend = StoreBackend::parse(&v)?;
        }
        if let Some(v) = env_var("DOCQA_DATA_DIR") {
            settings.data_dir = v;
        }
        if let Some(v) = env_var("DOCQA_COLLECTION_NAME") {
            settings.collection_name = v;
        }
        if let Some(v) = env_var("DOCQA_QDRANT_URL") {
            settings.qdrant_url = v;
        }
        if let Some(v) = env_parsed("DOCQA_CHUNK_SIZE")? {
            settings.chunk_size = v;
        }
        if let Some(v) = env_parsed("DOCQA_CHUNK_OVERLAP")? {
            settings.chunk_overlap = v;
        }
        if let Some(v) = env_parsed("DOCQA_TOP_K")? {
            settings.top_k = v;
        }
        if let Some(v) = env_var("DOCQA_HOST") {
            settings.host = v;
        }
        if let Some(v) = env_parsed("DOCQA_PORT")? {
            settings.port = v;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `temperature` is outside `[0, 2]`
    /// - `embedding_dimensions == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(QaError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(QaError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(QaError::Config("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(QaError::Config(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        if self.embedding_dimensions == 0 {
            return Err(QaError::Config(
                "embedding_dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

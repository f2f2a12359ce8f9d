//! Data types shared across the ingest and retrieval paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied and chunk-level metadata: string keys to arbitrary JSON.
pub type Metadata = serde_json::Map<String, Value>;

/// Maximum length of the user-facing source excerpt, in characters.
const SOURCE_EXCERPT_CHARS: usize = 200;

/// The raw result of a vector search: three parallel sequences, ordered by
/// ascending distance. Index `i` refers to the same logical record across
/// all three.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHits {
    /// The stored chunk texts.
    pub documents: Vec<String>,
    /// The metadata attached to each chunk.
    pub metadatas: Vec<Metadata>,
    /// Backend-native distances (lower is more similar). Not comparable
    /// across backends.
    pub distances: Vec<f32>,
}

impl SearchHits {
    /// True when the search matched nothing (empty index included).
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of hits.
    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// A retrieved chunk prepared for a caller: excerpted content, metadata,
/// and a normalized relevance score in `[0, 1]` (higher is more relevant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSource {
    /// Chunk text, truncated to an excerpt for display.
    pub content: String,
    /// The chunk metadata.
    pub metadata: Metadata,
    /// Backend-normalized similarity score.
    pub relevance_score: f32,
}

impl ScoredSource {
    /// Build a source from a full chunk text, truncating long content to
    /// an excerpt with a trailing ellipsis.
    pub fn new(text: &str, metadata: Metadata, relevance_score: f32) -> Self {
        let content = if text.chars().count() > SOURCE_EXCERPT_CHARS {
            let cut: String = text.chars().take(SOURCE_EXCERPT_CHARS).collect();
            format!("{cut}...")
        } else {
            text.to_string()
        };
        Self { content, metadata, relevance_score }
    }
}

/// Statistics about a store, or an error-shaped value when the backend
/// could not answer. `stats()` never fails; it degrades to
/// [`StoreStats::Error`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreStats {
    /// The store answered.
    Ready {
        /// Number of indexed records.
        total_documents: usize,
        /// The configured collection name.
        collection_name: String,
    },
    /// The store could not answer.
    Error {
        /// A description of the internal failure.
        error: String,
    },
}

/// A complete answer produced by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    /// The question as asked.
    pub question: String,
    /// The generated answer text.
    pub answer: String,
    /// The retrieved sources the answer was grounded on.
    pub sources: Vec<ScoredSource>,
    /// The model that produced the answer.
    pub model_used: String,
    /// Tokens consumed by generation, when the provider reports them.
    pub tokens_used: Option<u32>,
}

/// Receipt returned after ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    /// Number of chunks created and indexed.
    pub chunks_created: usize,
    /// The caller-supplied document id, if any.
    pub doc_id: Option<String>,
}

/// Liveness of the two external collaborators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Whether the document store answered its probe.
    pub vector_store: bool,
    /// Whether the generation provider answered its probe.
    pub llm: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_source_is_not_truncated() {
        let source = ScoredSource::new("short text", Metadata::new(), 0.5);
        assert_eq!(source.content, "short text");
    }

    #[test]
    fn long_source_is_excerpted_with_ellipsis() {
        let text = "x".repeat(300);
        let source = ScoredSource::new(&text, Metadata::new(), 0.5);
        assert_eq!(source.content.len(), 203);
        assert!(source.content.ends_with("..."));
    }

    #[test]
    fn stats_error_serializes_to_error_shape() {
        let stats = StoreStats::Error { error: "backend down".to_string() };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json, serde_json::json!({"error": "backend down"}));
    }
}

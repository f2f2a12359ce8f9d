//! Question-answering pipeline orchestrator.
//!
//! [`QaPipeline`] coordinates the full ingest-and-ask workflow by
//! composing a [`SentenceChunker`], a [`DocumentStore`], and an
//! [`AnswerGenerator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{QaPipeline, LexicalStore, MockGenerator, SentenceChunker};
//!
//! let pipeline = QaPipeline::builder()
//!     .chunker(SentenceChunker::new(1000, 200))
//!     .store(Arc::new(LexicalStore::open("./vector_db", "api_documentation")))
//!     .generator(Arc::new(MockGenerator::new()))
//!     .top_k(5)
//!     .build()?;
//!
//! pipeline.ingest(&content, Some("d1"), &Metadata::new()).await?;
//! let answer = pipeline.ask("How do I authenticate?", Default::default()).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{SentenceChunker, chunk_metadata};
use crate::document::{
    GeneratedAnswer, IngestReceipt, Metadata, ScoredSource, ServiceHealth, StoreStats,
};
use crate::error::{QaError, Result};
use crate::generation::{AnswerGenerator, GenerationOptions};
use crate::normalize::normalize;
use crate::store::DocumentStore;

/// Orchestrates ingest (normalize → chunk → index) and ask
/// (retrieve → generate). Construct one via [`QaPipeline::builder()`].
pub struct QaPipeline {
    chunker: SentenceChunker,
    store: Arc<dyn DocumentStore>,
    generator: Arc<dyn AnswerGenerator>,
    top_k: usize,
}

impl QaPipeline {
    /// Create a new [`QaPipelineBuilder`].
    pub fn builder() -> QaPipelineBuilder {
        QaPipelineBuilder::default()
    }

    /// The document store behind this pipeline.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The answer generator behind this pipeline.
    pub fn generator(&self) -> &Arc<dyn AnswerGenerator> {
        &self.generator
    }

    /// Ingest one document: normalize, chunk, attach metadata, index.
    ///
    /// When `doc_id` is supplied, chunk ids are derived from it as
    /// `{doc_id}_chunk_{index}`; otherwise the store generates ids.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Validation`] when the content normalizes to an
    /// empty string, and [`QaError::Pipeline`] when indexing fails.
    pub async fn ingest(
        &self,
        content: &str,
        doc_id: Option<&str>,
        extra_metadata: &Metadata,
    ) -> Result<IngestReceipt> {
        let normalized = normalize(content);
        if normalized.is_empty() {
            return Err(QaError::Validation("document content must not be empty".to_string()));
        }

        let chunks = self.chunker.chunk(&normalized);
        let total = chunks.len();

        let metadatas: Vec<Metadata> =
            (0..total).map(|i| chunk_metadata(i, total, doc_id, extra_metadata)).collect();

        let ids: Option<Vec<String>> = doc_id
            .filter(|id| !id.is_empty())
            .map(|id| (0..total).map(|i| format!("{id}_chunk_{i}")).collect());

        self.store.add_documents(&chunks, &metadatas, ids.as_deref()).await.map_err(|e| {
            error!(doc_id = ?doc_id, error = %e, "indexing failed during ingest");
            QaError::Pipeline(format!("failed to index document: {e}"))
        })?;

        info!(doc_id = ?doc_id, chunk_count = total, "ingested document");
        Ok(IngestReceipt { chunks_created: total, doc_id: doc_id.map(str::to_string) })
    }

    /// Retrieve the top-matching sources for a query, with distances
    /// normalized into `[0, 1]` relevance scores by the backend.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredSource>> {
        let hits = self.store.search(query, top_k).await.map_err(|e| {
            error!(error = %e, "search failed");
            QaError::Pipeline(format!("search failed: {e}"))
        })?;

        Ok(hits
            .documents
            .iter()
            .zip(hits.metadatas)
            .zip(hits.distances)
            .map(|((text, metadata), distance)| {
                ScoredSource::new(text, metadata, self.store.relevance(distance))
            })
            .collect())
    }

    /// Answer a question from indexed context.
    ///
    /// Returns `Ok(None)` when the index holds nothing relevant — the
    /// caller decides how to surface that (the HTTP layer maps it to
    /// 404). The generator receives the full chunk texts; the returned
    /// sources carry display excerpts.
    pub async fn ask(
        &self,
        question: &str,
        opts: GenerationOptions,
    ) -> Result<Option<GeneratedAnswer>> {
        let hits = self.store.search(question, self.top_k).await.map_err(|e| {
            error!(error = %e, "search failed during ask");
            QaError::Pipeline(format!("search failed: {e}"))
        })?;

        if hits.is_empty() {
            info!("no indexed context available for question");
            return Ok(None);
        }

        let generation =
            self.generator.generate(question, &hits.documents, opts).await.map_err(|e| {
                error!(error = %e, "generation failed");
                QaError::Pipeline(format!("generation failed: {e}"))
            })?;

        let sources: Vec<ScoredSource> = hits
            .documents
            .iter()
            .zip(hits.metadatas)
            .zip(hits.distances)
            .map(|((text, metadata), distance)| {
                ScoredSource::new(text, metadata, self.store.relevance(distance))
            })
            .collect();

        info!(backend = self.store.backend_name(), sources = sources.len(), "answered question");
        Ok(Some(GeneratedAnswer {
            question: question.to_string(),
            answer: generation.answer,
            sources,
            model_used: self.generator.model_name().to_string(),
            tokens_used: generation.tokens_used,
        }))
    }

    /// Probe both external collaborators.
    pub async fn health(&self) -> ServiceHealth {
        ServiceHealth {
            vector_store: self.store.health().await,
            llm: self.generator.health().await,
        }
    }

    /// Store statistics; never fails.
    pub async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }

    /// Delete one indexed chunk by id. Unknown ids are a logged no-op.
    pub async fn delete_document(&self, doc_id: &str) -> Result<()> {
        self.store.delete_document(doc_id).await
    }
}

/// Builder for [`QaPipeline`]. `store` and `generator` are required;
/// the chunker and `top_k` have sensible defaults.
#[derive(Default)]
pub struct QaPipelineBuilder {
    chunker: Option<SentenceChunker>,
    store: Option<Arc<dyn DocumentStore>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    top_k: Option<usize>,
}

impl QaPipelineBuilder {
    /// Set the chunker. Defaults to `SentenceChunker::new(1000, 200)`.
    pub fn chunker(mut self, chunker: SentenceChunker) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the document store backend.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the answer generator.
    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set how many sources each question retrieves. Defaults to 5.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Build the [`QaPipeline`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] if `store` or `generator` is missing,
    /// or if `top_k` is zero.
    pub fn build(self) -> Result<QaPipeline> {
        let store =
            self.store.ok_or_else(|| QaError::Config("store is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| QaError::Config("generator is required".to_string()))?;
        let top_k = self.top_k.unwrap_or(5);
        if top_k == 0 {
            return Err(QaError::Config("top_k must be greater than zero".to_string()));
        }

        Ok(QaPipeline {
            chunker: self.chunker.unwrap_or_else(|| SentenceChunker::new(1000, 200)),
            store,
            generator,
            top_k,
        })
    }
}

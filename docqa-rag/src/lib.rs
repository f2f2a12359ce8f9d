//! Retrieval core for the DocQA question-answering service.
//!
//! This crate provides:
//! - Text normalization and sentence-aware chunking
//! - A polymorphic [`DocumentStore`] with three backends: sparse lexical
//!   TF-IDF, flat exact nearest-neighbor, and Qdrant (`qdrant` feature)
//! - [`EmbeddingProvider`] and [`AnswerGenerator`] collaborator traits
//!   with OpenAI-backed and deterministic mock implementations
//! - The [`QaPipeline`] orchestrator tying ingest and ask together

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod mock;
pub mod normalize;
pub mod openai;
pub mod pipeline;
pub mod store;

pub mod flat;
pub mod lexical;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{SentenceChunker, chunk_metadata};
pub use config::{Settings, StoreBackend};
pub use document::{
    GeneratedAnswer, IngestReceipt, Metadata, ScoredSource, SearchHits, ServiceHealth, StoreStats,
};
pub use embedding::EmbeddingProvider;
pub use error::{QaError, Result};
pub use flat::FlatStore;
pub use generation::{AnswerGenerator, Generation, GenerationOptions};
pub use lexical::LexicalStore;
pub use mock::MockGenerator;
pub use normalize::normalize;
pub use openai::{OpenAiEmbeddingProvider, OpenAiGenerator};
pub use pipeline::{QaPipeline, QaPipelineBuilder};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantStore;
pub use store::DocumentStore;

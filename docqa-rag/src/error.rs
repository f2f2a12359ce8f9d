//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur in the retrieval core.
#[derive(Debug, Error)]
pub enum QaError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during answer generation.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the document store backend.
    #[error("Store error ({backend}): {message}")]
    Store {
        /// The store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// Saving or loading persisted index state failed.
    ///
    /// Load failures are handled inside the backends (the store degrades
    /// to empty); save failures propagate so data-loss risk is surfaced.
    #[error("Persistence error ({path}): {message}")]
    Persistence {
        /// The file the operation was writing to or reading from.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed caller input, rejected before reaching the index.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An error in pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, QaError>;

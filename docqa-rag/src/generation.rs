//! Answer generation trait.

use async_trait::async_trait;

use crate::error::Result;

/// Per-request generation knobs. Both fall back to configured defaults
/// when the caller leaves them unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationOptions {
    /// Maximum tokens in the generated answer.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

/// A generated answer plus the provider's reported token usage.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The answer text.
    pub answer: String,
    /// Total tokens consumed, when the provider reports usage.
    pub tokens_used: Option<u32>,
}

/// A language-model collaborator that answers a question given retrieved
/// context documents.
///
/// Two implementations ship with the crate: the OpenAI-backed
/// [`OpenAiGenerator`](crate::OpenAiGenerator) and the deterministic
/// [`MockGenerator`](crate::MockGenerator) used by the test suite and
/// offline deployments.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer to `question` grounded on `context_docs`.
    async fn generate(
        &self,
        question: &str,
        context_docs: &[String],
        opts: GenerationOptions,
    ) -> Result<Generation>;

    /// Best-effort liveness probe. Never fails; internal errors map to
    /// `false`.
    async fn health(&self) -> bool;

    /// Name of the underlying model, reported back to callers.
    fn model_name(&self) -> &str;
}

//! Deterministic answer generator for tests and offline deployments.
//!
//! [`MockGenerator`] implements [`AnswerGenerator`] without any network
//! dependency: it extracts keywords from the question, scores sentences
//! from the retrieved context against them, and fills one of four answer
//! templates chosen by question type.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::Result;
use crate::generation::{AnswerGenerator, Generation, GenerationOptions};

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid regex"));
static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// Question words stripped before keyword extraction.
const QUESTION_STOP_WORDS: [&str; 19] = [
    "how", "what", "when", "where", "why", "who", "which", "do", "does", "is", "are", "can",
    "the", "a", "an", "i", "to", "with", "for",
];

/// How a question is phrased, which picks the answer template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuestionKind {
    HowTo,
    Definition,
    List,
    General,
}

/// A deterministic [`AnswerGenerator`] that simulates grounded responses.
///
/// Useful for end-to-end tests of the retrieval path and for running the
/// service without a live model.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator;

impl MockGenerator {
    /// Create a new mock generator.
    pub fn new() -> Self {
        Self
    }

    /// Extract up to five keywords: lowercase words longer than two
    /// characters that are not question stop words.
    fn extract_keywords(question: &str) -> Vec<String> {
        let lowered = question.to_lowercase();
        WORD_RE
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .filter(|w| w.len() > 2 && !QUESTION_STOP_WORDS.contains(&w.as_str()))
            .take(5)
            .collect()
    }

    /// Pick the most keyword-dense sentences from the top context docs.
    fn find_relevant_info(context_docs: &[String], keywords: &[String]) -> String {
        let mut scored: Vec<(usize, String)> = Vec::new();

        for doc in context_docs.iter().take(3) {
            for sentence in SENTENCE_SPLIT_RE.split(doc) {
                let sentence = sentence.trim();
                if sentence.len() <= 20 {
                    continue;
                }
                let lowered = sentence.to_lowercase();
                let score = keywords.iter().filter(|kw| lowered.contains(kw.as_str())).count();
                if score > 0 {
                    scored.push((score, sentence.to_string()));
                }
            }
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        if scored.is_empty() {
            // Fall back to the head of the best-ranked document.
            return context_docs[0].chars().take(400).collect();
        }
        scored.into_iter().take(3).map(|(_, s)| s).collect::<Vec<_>>().join(" ")
    }

    fn classify(question: &str) -> QuestionKind {
        let q = question.to_lowercase();
        if ["how do i", "how to", "how can i", "how does"].iter().any(|p| q.contains(p)) {
            QuestionKind::HowTo
        } else if ["what is", "what are", "what does"].iter().any(|p| q.contains(p)) {
            QuestionKind::Definition
        } else if ["list", "show me", "what are the"].iter().any(|p| q.contains(p)) {
            QuestionKind::List
        } else {
            QuestionKind::General
        }
    }

    fn format_answer(kind: QuestionKind, question: &str, info: &str) -> String {
        match kind {
            QuestionKind::HowTo => format!(
                "To accomplish this, according to the documentation: {info} This provides the \
                 steps needed to answer: \"{question}\" Make sure to follow the authentication \
                 and rate limiting guidelines mentioned in the API documentation."
            ),
            QuestionKind::Definition => format!(
                "Based on the API documentation: {info} This explains the concept you asked \
                 about. For implementation details and examples, refer to the complete \
                 documentation."
            ),
            QuestionKind::List => format!(
                "According to the documentation, here are the relevant details: {info} These are \
                 the key points that address your question: \"{question}\" Check the full API \
                 reference for additional options and parameters."
            ),
            QuestionKind::General => format!(
                "Based on the API documentation: {info} This information directly addresses your \
                 question. For more detailed information or code examples, please consult the \
                 complete API documentation."
            ),
        }
    }
}

#[async_trait]
impl AnswerGenerator for MockGenerator {
    async fn generate(
        &self,
        question: &str,
        context_docs: &[String],
        _opts: GenerationOptions,
    ) -> Result<Generation> {
        if context_docs.is_empty() {
            let answer = "I couldn't find relevant information in the documentation to answer \
                          your question. Please ensure documentation has been uploaded or try \
                          rephrasing your question."
                .to_string();
            let tokens_used = answer.split_whitespace().count() as u32;
            return Ok(Generation { answer, tokens_used: Some(tokens_used) });
        }

        let keywords = Self::extract_keywords(question);
        let info = Self::find_relevant_info(context_docs, &keywords);
        let kind = Self::classify(question);
        let answer = Self::format_answer(kind, question, &info);
        let tokens_used = answer.split_whitespace().count() as u32;

        Ok(Generation { answer, tokens_used: Some(tokens_used) })
    }

    async fn health(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "mock-gpt-4"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_skip_stop_words_and_short_words() {
        let keywords = MockGenerator::extract_keywords("How do I authenticate with the API?");
        assert_eq!(keywords, vec!["authenticate".to_string(), "api".to_string()]);
    }

    #[test]
    fn classifies_question_kinds() {
        assert_eq!(MockGenerator::classify("How do I paginate?"), QuestionKind::HowTo);
        assert_eq!(MockGenerator::classify("What is a token?"), QuestionKind::Definition);
        assert_eq!(MockGenerator::classify("List the endpoints"), QuestionKind::List);
        assert_eq!(MockGenerator::classify("Tell me about limits"), QuestionKind::General);
    }

    #[tokio::test]
    async fn empty_context_yields_fallback_answer() {
        let generation = MockGenerator::new()
            .generate("How do I authenticate?", &[], GenerationOptions::default())
            .await
            .unwrap();
        assert!(generation.answer.contains("couldn't find relevant information"));
        assert!(generation.tokens_used.unwrap() > 0);
    }

    #[tokio::test]
    async fn answer_quotes_relevant_sentences_from_context() {
        let docs = vec![
            "Authentication requires a Bearer token in the Authorization header. Rate limits \
             apply per key."
                .to_string(),
        ];
        let generation = MockGenerator::new()
            .generate("How do I authenticate my requests?", &docs, GenerationOptions::default())
            .await
            .unwrap();
        assert!(generation.answer.contains("Bearer token"));
    }

    #[tokio::test]
    async fn health_is_always_true() {
        let generator = MockGenerator::new();
        assert!(generator.health().await);
        assert!(generator.health().await);
    }
}

//! Sparse lexical store: TF-IDF vectors with cosine distance.
//!
//! [`LexicalStore`] needs no embedding provider — it fits a TF-IDF
//! vectorizer over the indexed corpus and re-fits it on every mutation,
//! so adds and deletes are O(N) re-indexing operations. State persists as
//! a single JSON blob under the configured data directory.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::document::{Metadata, SearchHits, StoreStats};
use crate::error::Result;
use crate::store::{DocumentStore, atomic_write, generate_doc_ids, rank_ascending, validate_batch};

const STORE_FILE: &str = "lexical_store.json";

/// Vocabulary cap for the fitted vectorizer.
const MAX_FEATURES: usize = 1000;

/// Tokens are lowercase runs of two or more word characters.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// English stop words excluded from the vocabulary.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just", "me", "more",
    "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or",
    "other", "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you",
    "your", "yours", "yourself",
];

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// A sparse vector: `(column, weight)` pairs sorted by column.
type SparseVec = Vec<(u32, f32)>;

/// Dot product of two column-sorted sparse vectors.
fn sparse_dot(a: &SparseVec, b: &SparseVec) -> f32 {
    let (mut i, mut j, mut dot) = (0usize, 0usize, 0.0f32);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

/// A fitted TF-IDF vectorizer: vocabulary columns in alphabetical term
/// order, smoothed inverse document frequencies per column.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TfidfModel {
    vocabulary: BTreeMap<String, u32>,
    idf: Vec<f32>,
}

impl TfidfModel {
    /// Fit over a corpus: count document frequencies, keep the
    /// `max_features` most frequent terms (ties broken alphabetically),
    /// and compute `idf = ln((1 + n) / (1 + df)) + 1`.
    fn fit(documents: &[String], max_features: usize) -> Self {
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc);
            let mut seen: std::collections::BTreeSet<&str> = std::collections::BTreeSet::new();
            for token in &tokens {
                *term_counts.entry(token.clone()).or_default() += 1;
                seen.insert(token.as_str());
            }
            for term in seen {
                *doc_freqs.entry(term.to_string()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let vocabulary: BTreeMap<String, u32> = ranked
            .into_iter()
            .map(|(term, _)| term)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(column, term)| (term, column as u32))
            .collect();

        let n_docs = documents.len() as f32;
        let mut idf = vec![0.0f32; vocabulary.len()];
        for (term, &column) in &vocabulary {
            let df = doc_freqs.get(term).copied().unwrap_or(0) as f32;
            idf[column as usize] = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
        }

        Self { vocabulary, idf }
    }

    /// Vectorize one text: term counts weighted by idf, L2-normalized.
    fn transform(&self, text: &str) -> SparseVec {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&column) = self.vocabulary.get(&token) {
                *counts.entry(column).or_default() += 1.0;
            }
        }

        let mut vector: SparseVec =
            counts.into_iter().map(|(col, tf)| (col, tf * self.idf[col as usize])).collect();

        let norm: f32 = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut vector {
                *w /= norm;
            }
        }
        vector
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LexicalState {
    documents: Vec<String>,
    metadatas: Vec<Metadata>,
    doc_ids: Vec<String>,
    model: Option<TfidfModel>,
    vectors: Vec<SparseVec>,
}

impl LexicalState {
    /// Refit the vectorizer and recompute every stored vector.
    fn reindex(&mut self) {
        if self.documents.is_empty() {
            self.model = None;
            self.vectors.clear();
            return;
        }
        let model = TfidfModel::fit(&self.documents, MAX_FEATURES);
        self.vectors = self.documents.iter().map(|d| model.transform(d)).collect();
        self.model = Some(model);
    }
}

/// A [`DocumentStore`] over TF-IDF vectors with cosine distance
/// (`1 - cosine_similarity`).
///
/// Suitable for running the full service without any embedding provider.
pub struct LexicalStore {
    state: RwLock<LexicalState>,
    path: PathBuf,
    collection_name: String,
}

impl LexicalStore {
    /// Open a store rooted at `data_dir`, loading any persisted state.
    ///
    /// A missing blob starts the store empty; an unreadable blob is
    /// logged and the store degrades to empty rather than failing
    /// startup.
    pub fn open(data_dir: impl Into<PathBuf>, collection_name: impl Into<String>) -> Self {
        let path = data_dir.into().join(STORE_FILE);
        let state = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<LexicalState>(&bytes) {
                Ok(state) => {
                    info!(documents = state.documents.len(), "loaded existing lexical index");
                    state
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to decode lexical index, starting empty");
                    LexicalState::default()
                }
            },
            Err(_) => {
                info!("no existing lexical index found, starting fresh");
                LexicalState::default()
            }
        };

        Self { state: RwLock::new(state), path, collection_name: collection_name.into() }
    }

    fn persist(&self, state: &LexicalState) -> Result<()> {
        let bytes = serde_json::to_vec(state).map_err(|e| crate::error::QaError::Persistence {
            path: self.path.display().to_string(),
            message: format!("failed to encode state: {e}"),
        })?;
        atomic_write(&self.path, &bytes)
    }
}

#[async_trait]
impl DocumentStore for LexicalStore {
    fn backend_name(&self) -> &'static str {
        "lexical"
    }

    async fn add_documents(
        &self,
        texts: &[String],
        metadatas: &[Metadata],
        ids: Option<&[String]>,
    ) -> Result<()> {
        validate_batch(texts, metadatas, ids)?;
        if texts.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        let ids = match ids {
            Some(ids) => ids.to_vec(),
            None => generate_doc_ids(texts.len()),
        };
        state.documents.extend_from_slice(texts);
        state.metadatas.extend_from_slice(metadatas);
        state.doc_ids.extend(ids);
        state.reindex();
        self.persist(&state)?;

        info!(count = texts.len(), total = state.documents.len(), "added documents to lexical index");
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<SearchHits> {
        let state = self.state.read().await;
        if state.documents.is_empty() {
            warn!("no documents in lexical index");
            return Ok(SearchHits::default());
        }

        let Some(model) = state.model.as_ref() else {
            // Only reachable through a hand-edited blob; treat as empty.
            warn!("lexical index has documents but no fitted model");
            return Ok(SearchHits::default());
        };
        let query_vec = model.transform(query);

        let distances: Vec<f32> =
            state.vectors.iter().map(|v| 1.0 - sparse_dot(&query_vec, v)).collect();

        let mut hits = SearchHits::default();
        for i in rank_ascending(&distances, top_k) {
            hits.documents.push(state.documents[i].clone());
            hits.metadatas.push(state.metadatas[i].clone());
            hits.distances.push(distances[i]);
        }
        info!(results = hits.len(), "lexical search completed");
        Ok(hits)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(index) = state.doc_ids.iter().position(|id| id == doc_id) else {
            warn!(doc_id, "document not found, delete is a no-op");
            return Ok(());
        };

        state.documents.remove(index);
        state.metadatas.remove(index);
        state.doc_ids.remove(index);
        state.reindex();
        self.persist(&state)?;

        info!(doc_id, remaining = state.documents.len(), "deleted document from lexical index");
        Ok(())
    }

    async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats::Ready {
            total_documents: state.documents.len(),
            collection_name: self.collection_name.clone(),
        }
    }

    async fn health(&self) -> bool {
        let state = self.state.read().await;
        state.documents.len() == state.metadatas.len()
            && state.documents.len() == state.doc_ids.len()
    }

    fn relevance(&self, distance: f32) -> f32 {
        (1.0 - distance).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_drops_stop_words() {
        let tokens = tokenize("The Bearer token IS required");
        assert_eq!(tokens, vec!["bearer", "token", "required"]);
    }

    #[test]
    fn tokenize_ignores_single_character_words() {
        let tokens = tokenize("a b cd efg");
        assert_eq!(tokens, vec!["cd", "efg"]);
    }

    #[test]
    fn fitted_vocabulary_is_capped_and_alphabetical() {
        let docs: Vec<String> =
            (0..30).map(|i| format!("term{i} shared keyword payload")).collect();
        let model = TfidfModel::fit(&docs, 10);
        assert!(model.vocabulary.len() <= 10);
        let columns: Vec<u32> = model.vocabulary.values().copied().collect();
        let mut sorted = columns.clone();
        sorted.sort_unstable();
        assert_eq!(columns, sorted);
    }

    #[test]
    fn transform_produces_unit_vectors() {
        let docs = vec!["bearer token auth".to_string(), "rate limit quota".to_string()];
        let model = TfidfModel::fit(&docs, 100);
        let vector = model.transform("bearer token");
        let norm: f32 = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn query_matching_nothing_has_distance_one() {
        let docs = vec!["bearer token auth".to_string()];
        let model = TfidfModel::fit(&docs, 100);
        let query = model.transform("zebra quantum");
        let doc = model.transform(&docs[0]);
        assert_eq!(1.0 - sparse_dot(&query, &doc), 1.0);
    }
}

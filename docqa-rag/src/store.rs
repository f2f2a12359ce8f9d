//! Document store trait: one polymorphic indexing interface, three
//! interchangeable backends selected at construction time.

use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

use crate::document::{Metadata, SearchHits, StoreStats};
use crate::error::{QaError, Result};

/// A searchable index of embedded text chunks.
///
/// Backends own their embedding strategy: the dense backends call the
/// configured [`EmbeddingProvider`](crate::EmbeddingProvider), the sparse
/// lexical backend vectorizes internally. Distances are backend-native
/// (squared L2 for the flat backend, cosine distance for the others) and
/// must not be compared across backends; use
/// [`relevance`](DocumentStore::relevance) for a normalized score.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{DocumentStore, LexicalStore};
///
/// let store = LexicalStore::open("./vector_db", "api_documentation");
/// store.add_documents(&texts, &metadatas, None).await?;
/// let hits = store.search("How do I authenticate?", 5).await?;
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend identifier used in logs and errors.
    fn backend_name(&self) -> &'static str;

    /// Index a batch of chunks.
    ///
    /// `texts` and `metadatas` (and `ids` when given) must be parallel
    /// slices of equal length. Texts are embedded in a single batched
    /// provider call. When `ids` is `None`, collision-free ids are
    /// generated. File-backed stores persist before returning.
    async fn add_documents(
        &self,
        texts: &[String],
        metadatas: &[Metadata],
        ids: Option<&[String]>,
    ) -> Result<()>;

    /// Return the `min(top_k, size)` nearest records, ascending by
    /// distance. An empty index yields empty hits, not an error.
    async fn search(&self, query: &str, top_k: usize) -> Result<SearchHits>;

    /// Delete one record by id. Unknown ids are a logged no-op.
    ///
    /// The lexical backend refits its vocabulary over the remaining
    /// corpus, an O(N) re-index; batch deletions where possible.
    async fn delete_document(&self, doc_id: &str) -> Result<()>;

    /// Collection statistics. Never fails; internal errors degrade to
    /// [`StoreStats::Error`].
    async fn stats(&self) -> StoreStats;

    /// Best-effort liveness probe. Internal errors map to `false`.
    async fn health(&self) -> bool;

    /// Map a backend-native distance into a `[0, 1]` similarity score.
    fn relevance(&self, distance: f32) -> f32;
}

/// Check that the parallel input slices line up.
pub(crate) fn validate_batch(
    texts: &[String],
    metadatas: &[Metadata],
    ids: Option<&[String]>,
) -> Result<()> {
    if texts.len() != metadatas.len() {
        return Err(QaError::Validation(format!(
            "texts ({}) and metadatas ({}) must have the same length",
            texts.len(),
            metadatas.len()
        )));
    }
    if let Some(ids) = ids {
        if ids.len() != texts.len() {
            return Err(QaError::Validation(format!(
                "ids ({}) and texts ({}) must have the same length",
                ids.len(),
                texts.len()
            )));
        }
    }
    Ok(())
}

/// Generate collision-free record ids.
///
/// Ids derived from the current index size collide after deletions and
/// under concurrent writers; random UUIDs avoid that while keeping the
/// `doc_` prefix.
pub(crate) fn generate_doc_ids(count: usize) -> Vec<String> {
    (0..count).map(|_| format!("doc_{}", Uuid::new_v4().simple())).collect()
}

/// Indices of the `top_k` smallest distances, ascending.
pub(crate) fn rank_ascending(distances: &[f32], top_k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..distances.len()).collect();
    indices.sort_by(|&a, &b| {
        distances[a].partial_cmp(&distances[b]).unwrap_or(std::cmp::Ordering::Equal)
    });
    indices.truncate(top_k.min(distances.len()));
    indices
}

/// Write `bytes` to `path` atomically: write a sibling temp file, then
/// rename over the destination, so a crash mid-write never leaves a
/// truncated blob behind.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let persist_err = |message: String| QaError::Persistence {
        path: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| persist_err(format!("failed to create directory: {e}")))?;
    }

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)
        .map_err(|e| persist_err(format!("failed to write temp file: {e}")))?;
    std::fs::rename(&tmp, path).map_err(|e| persist_err(format!("failed to rename: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let ids = generate_doc_ids(50);
        assert_eq!(ids.len(), 50);
        assert!(ids.iter().all(|id| id.starts_with("doc_")));
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn rank_ascending_orders_and_truncates() {
        let distances = [0.9, 0.1, 0.5, 0.3];
        assert_eq!(rank_ascending(&distances, 3), vec![1, 3, 2]);
        assert_eq!(rank_ascending(&distances, 10), vec![1, 3, 2, 0]);
        assert!(rank_ascending(&[], 5).is_empty());
    }

    #[test]
    fn mismatched_batch_lengths_are_rejected() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let metadatas = vec![Metadata::new()];
        assert!(matches!(
            validate_batch(&texts, &metadatas, None),
            Err(QaError::Validation(_))
        ));
    }
}

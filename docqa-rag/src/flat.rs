//! Flat exact nearest-neighbor store over dense embeddings.
//!
//! [`FlatStore`] embeds texts through the configured
//! [`EmbeddingProvider`] and scans every stored vector per query with
//! squared-L2 distance. State persists as two files under the data
//! directory: a binary vectors blob and a JSON metadata blob. Because the
//! raw vectors are retained, deletes are in-place and need no
//! re-embedding.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::document::{Metadata, SearchHits, StoreStats};
use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::store::{DocumentStore, atomic_write, generate_doc_ids, rank_ascending, validate_batch};

const INDEX_FILE: &str = "flat_index.bin";
const META_FILE: &str = "flat_meta.json";

/// Squared Euclidean distance. Cheaper than true L2 and order-preserving,
/// which is all nearest-neighbor ranking needs.
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// The serialized index structure: every stored vector plus the expected
/// dimensionality.
#[derive(Debug, Serialize, Deserialize)]
struct VectorBlob {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

/// The metadata blob, parallel to the vectors.
#[derive(Debug, Default, Serialize, Deserialize)]
struct MetaBlob {
    documents: Vec<String>,
    metadatas: Vec<Metadata>,
    doc_ids: Vec<String>,
}

#[derive(Debug, Default)]
struct FlatState {
    documents: Vec<String>,
    metadatas: Vec<Metadata>,
    doc_ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl FlatState {
    fn is_aligned(&self) -> bool {
        self.documents.len() == self.metadatas.len()
            && self.documents.len() == self.doc_ids.len()
            && self.documents.len() == self.vectors.len()
    }
}

/// A [`DocumentStore`] doing exact nearest-neighbor search over dense
/// embeddings with squared-L2 distance.
pub struct FlatStore {
    state: RwLock<FlatState>,
    provider: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
    index_path: PathBuf,
    meta_path: PathBuf,
    collection_name: String,
}

impl FlatStore {
    /// Open a store rooted at `data_dir`, loading any persisted state.
    ///
    /// The vector dimensionality is fixed from `provider` for the life of
    /// the store. Unreadable or inconsistent blobs are logged and the
    /// store degrades to empty rather than failing startup.
    pub fn open(
        data_dir: impl Into<PathBuf>,
        collection_name: impl Into<String>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        let data_dir = data_dir.into();
        let index_path = data_dir.join(INDEX_FILE);
        let meta_path = data_dir.join(META_FILE);
        let dimensions = provider.dimensions();

        let state = Self::load(&index_path, &meta_path, dimensions).unwrap_or_default();
        if !state.documents.is_empty() {
            info!(documents = state.documents.len(), "loaded existing flat index");
        } else {
            info!("no existing flat index found, starting fresh");
        }

        Self {
            state: RwLock::new(state),
            provider,
            dimensions,
            index_path,
            meta_path,
            collection_name: collection_name.into(),
        }
    }

    fn load(index_path: &std::path::Path, meta_path: &std::path::Path, dimensions: usize) -> Option<FlatState> {
        let index_bytes = std::fs::read(index_path).ok()?;
        let meta_bytes = std::fs::read(meta_path).ok()?;

        let blob: VectorBlob = match bincode::deserialize(&index_bytes) {
            Ok(blob) => blob,
            Err(e) => {
                error!(path = %index_path.display(), error = %e, "failed to decode flat index, starting empty");
                return None;
            }
        };
        let meta: MetaBlob = match serde_json::from_slice(&meta_bytes) {
            Ok(meta) => meta,
            Err(e) => {
                error!(path = %meta_path.display(), error = %e, "failed to decode flat metadata, starting empty");
                return None;
            }
        };

        if blob.dimensions != dimensions {
            error!(
                stored = blob.dimensions,
                expected = dimensions,
                "flat index dimensionality does not match the embedding provider, starting empty"
            );
            return None;
        }

        let state = FlatState {
            documents: meta.documents,
            metadatas: meta.metadatas,
            doc_ids: meta.doc_ids,
            vectors: blob.vectors,
        };
        if !state.is_aligned() {
            error!("flat index blobs are misaligned, starting empty");
            return None;
        }
        Some(state)
    }

    fn persist(&self, state: &FlatState) -> Result<()> {
        let blob = VectorBlob { dimensions: self.dimensions, vectors: state.vectors.clone() };
        let index_bytes =
            bincode::serialize(&blob).map_err(|e| QaError::Persistence {
                path: self.index_path.display().to_string(),
                message: format!("failed to encode vectors: {e}"),
            })?;

        let meta = MetaBlob {
            documents: state.documents.clone(),
            metadatas: state.metadatas.clone(),
            doc_ids: state.doc_ids.clone(),
        };
        let meta_bytes = serde_json::to_vec(&meta).map_err(|e| QaError::Persistence {
            path: self.meta_path.display().to_string(),
            message: format!("failed to encode metadata: {e}"),
        })?;

        atomic_write(&self.index_path, &index_bytes)?;
        atomic_write(&self.meta_path, &meta_bytes)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(QaError::Validation(format!(
                "embedding has {} dimensions, index expects {}",
                vector.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlatStore {
    fn backend_name(&self) -> &'static str {
        "flat"
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

        // One batched provider call per invocation, never one-at-a-time.
        let refs: Vec<&str> = texts.iter().map(|t| t.as_str()).collect();
        let embeddings = self.provider.embed_batch(&refs).await?;
        if embeddings.len() != texts.len() {
            return Err(QaError::Embedding {
                provider: "flat-store".into(),
                message: format!(
                    "provider returned {} embeddings for {} texts",
                    embeddings.len(),
                    texts.len()
                ),
            });
        }
        for embedding in &embeddings {
            self.check_dimensions(embedding)?;
        }

        let mut state = self.state.write().await;
        let ids = match ids {
            Some(ids) => ids.to_vec(),
            None => generate_doc_ids(texts.len()),
        };
        state.documents.extend_from_slice(texts);
        state.metadatas.extend_from_slice(metadatas);
        state.doc_ids.extend(ids);
        state.vectors.extend(embeddings);
        self.persist(&state)?;

        info!(count = texts.len(), total = state.documents.len(), "added documents to flat index");
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<SearchHits> {
        {
            let state = self.state.read().await;
            if state.documents.is_empty() {
                warn!("no documents in flat index");
                return Ok(SearchHits::default());
            }
        }

        let query_vec = self.provider.embed(query).await?;
        self.check_dimensions(&query_vec)?;

        let state = self.state.read().await;
        let distances: Vec<f32> =
            state.vectors.iter().map(|v| squared_l2(&query_vec, v)).collect();

        let mut hits = SearchHits::default();
        for i in rank_ascending(&distances, top_k) {
            hits.documents.push(state.documents[i].clone());
            hits.metadatas.push(state.metadatas[i].clone());
            hits.distances.push(distances[i]);
        }
        info!(results = hits.len(), "flat search completed");
        Ok(hits)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(index) = state.doc_ids.iter().position(|id| id == doc_id) else {
            warn!(doc_id, "document not found, delete is a no-op");
            return Ok(());
        };

        // Raw vectors are retained, so removal keeps the parallel
        // sequences aligned without re-embedding anything.
        state.documents.remove(index);
        state.metadatas.remove(index);
        state.doc_ids.remove(index);
        state.vectors.remove(index);
        self.persist(&state)?;

        info!(doc_id, remaining = state.documents.len(), "deleted document from flat index");
        Ok(())
    }

    async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        if !state.is_aligned() {
            return StoreStats::Error { error: "flat index state is misaligned".to_string() };
        }
        StoreStats::Ready {
            total_documents: state.documents.len(),
            collection_name: self.collection_name.clone(),
        }
    }

    async fn health(&self) -> bool {
        self.state.read().await.is_aligned()
    }

    fn relevance(&self, distance: f32) -> f32 {
        // Squared L2 is unbounded above, so `1 - distance` would produce
        // negative scores; this maps [0, ∞) monotonically onto (0, 1].
        1.0 / (1.0 + distance.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_l2_of_identical_vectors_is_zero() {
        let v = vec![0.5, -0.25, 1.0];
        assert_eq!(squared_l2(&v, &v), 0.0);
    }

    #[test]
    fn squared_l2_grows_with_separation() {
        let origin = vec![0.0, 0.0];
        let near = vec![1.0, 0.0];
        let far = vec![3.0, 4.0];
        assert!(squared_l2(&origin, &near) < squared_l2(&origin, &far));
    }
}

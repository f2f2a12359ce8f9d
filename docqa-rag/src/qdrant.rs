//! Qdrant-backed document store.
//!
//! Provides [`QdrantStore`], the managed-collection backend over the
//! [qdrant-client](https://docs.rs/qdrant-client) gRPC API. Only available
//! when the `qdrant` feature is enabled.
//!
//! Points carry the caller-visible record id in their payload (`doc_id`)
//! rather than as the Qdrant point id, because point ids are restricted to
//! UUIDs and integers while callers may pass arbitrary strings.

use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::document::{Metadata, SearchHits, StoreStats};
use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::store::{DocumentStore, generate_doc_ids, validate_batch};

/// A [`DocumentStore`] backed by a [Qdrant](https://qdrant.tech/)
/// collection with cosine distance.
///
/// Search scores reported by Qdrant are cosine *similarities*; they are
/// converted to `1 - score` so the trait's ascending-distance contract
/// holds.
pub struct QdrantStore {
    client: Qdrant,
    provider: Arc<dyn EmbeddingProvider>,
    collection_name: String,
}

fn map_err(e: qdrant_client::QdrantError) -> QaError {
    QaError::Store { backend: "qdrant".to_string(), message: e.to_string() }
}

/// Convert a Qdrant payload value into plain JSON.
fn json_from_qdrant(value: &QdrantValue) -> Value {
    match &value.kind {
        Some(Kind::DoubleValue(v)) => serde_json::json!(v),
        Some(Kind::IntegerValue(v)) => serde_json::json!(v),
        Some(Kind::StringValue(v)) => Value::String(v.clone()),
        Some(Kind::BoolValue(v)) => Value::Bool(*v),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields.iter().map(|(k, v)| (k.clone(), json_from_qdrant(v))).collect(),
        ),
        Some(Kind::ListValue(l)) => Value::Array(l.values.iter().map(json_from_qdrant).collect()),
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}

impl QdrantStore {
    /// Connect to Qdrant and ensure the collection exists.
    ///
    /// The collection is created with the provider's dimensionality and
    /// cosine distance when missing. Unlike the file-backed stores, a
    /// failure here propagates: a managed collection that cannot be
    /// created leaves nothing to degrade to.
    pub async fn connect(
        url: &str,
        collection_name: impl Into<String>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let collection_name = collection_name.into();
        let client = Qdrant::from_url(url).build().map_err(map_err)?;

        let collections = client.list_collections().await.map_err(map_err)?;
        let exists = collections.collections.iter().any(|c| c.name == collection_name);
        if exists {
            debug!(collection = %collection_name, "qdrant collection already exists");
        } else {
            let dimensions = provider.dimensions() as u64;
            client
                .create_collection(
                    CreateCollectionBuilder::new(&collection_name)
                        .vectors_config(VectorParamsBuilder::new(dimensions, Distance::Cosine)),
                )
                .await
                .map_err(map_err)?;
            info!(collection = %collection_name, dimensions, "created qdrant collection");
        }

        Ok(Self { client, provider, collection_name })
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection_name).exact(true))
            .await
            .map_err(map_err)?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}

#[async_trait]
impl DocumentStore for QdrantStore {
    fn backend_name(&self) -> &'static str {
        "qdrant"
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

        let refs: Vec<&str> = texts.iter().map(|t| t.as_str()).collect();
        let embeddings = self.provider.embed_batch(&refs).await?;

        let ids = match ids {
            Some(ids) => ids.to_vec(),
            None => generate_doc_ids(texts.len()),
        };

        let points: Vec<PointStruct> = texts
            .iter()
            .zip(metadatas)
            .zip(ids)
            .zip(embeddings)
            .map(|(((text, metadata), id), embedding)| {
                let mut payload_map = serde_json::Map::new();
                payload_map.insert("doc_id".to_string(), Value::String(id));
                payload_map.insert("text".to_string(), Value::String(text.clone()));
                payload_map.insert("metadata".to_string(), Value::Object(metadata.clone()));
                let payload =
                    Payload::try_from(Value::Object(payload_map)).unwrap_or_default();

                PointStruct::new(Uuid::new_v4().to_string(), embedding, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points).wait(true))
            .await
            .map_err(map_err)?;

        info!(count = texts.len(), collection = %self.collection_name, "added documents to qdrant");
        Ok(())
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<SearchHits> {
        if self.count().await? == 0 {
            warn!(collection = %self.collection_name, "no documents in qdrant collection");
            return Ok(SearchHits::default());
        }

        let query_vec = self.provider.embed(query).await?;

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection_name, query_vec, top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(map_err)?;

        let mut hits = SearchHits::default();
        for scored in response.result {
            let text = scored
                .payload
                .get("text")
                .map(json_from_qdrant)
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            let metadata = scored
                .payload
                .get("metadata")
                .map(json_from_qdrant)
                .and_then(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .unwrap_or_default();

            hits.documents.push(text);
            hits.metadatas.push(metadata);
            // Cosine similarity → cosine distance.
            hits.distances.push(1.0 - scored.score);
        }
        info!(results = hits.len(), "qdrant search completed");
        Ok(hits)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        let filter = Filter::must([Condition::matches("doc_id", doc_id.to_string())]);

        let matched = self
            .client
            .count(
                CountPointsBuilder::new(&self.collection_name).filter(filter.clone()).exact(true),
            )
            .await
            .map_err(map_err)?
            .result
            .map(|r| r.count)
            .unwrap_or(0);
        if matched == 0 {
            warn!(doc_id, "document not found, delete is a no-op");
            return Ok(());
        }

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection_name).points(filter).wait(true),
            )
            .await
            .map_err(map_err)?;

        info!(doc_id, collection = %self.collection_name, "deleted document from qdrant");
        Ok(())
    }

    async fn stats(&self) -> StoreStats {
        match self.count().await {
            Ok(total_documents) => StoreStats::Ready {
                total_documents,
                collection_name: self.collection_name.clone(),
            },
            Err(e) => StoreStats::Error { error: e.to_string() },
        }
    }

    async fn health(&self) -> bool {
        self.client.health_check().await.is_ok()
    }

    fn relevance(&self, distance: f32) -> f32 {
        (1.0 - distance).clamp(0.0, 1.0)
    }
}

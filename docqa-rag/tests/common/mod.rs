//! Shared test doubles.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use docqa_rag::{EmbeddingProvider, Result};

/// Deterministic, network-free embedding provider: tokens are hashed into
/// a fixed number of buckets and the resulting count vector is
/// L2-normalized. Texts sharing tokens land near each other, which is all
/// the ranking tests need.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text.to_lowercase().split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            if token.is_empty() {
                continue;
            }
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            token.hash(&mut hasher);
            vector[(hasher.finish() % self.dims as u64) as usize] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

//! Batched embedding with zero-vector substitution for failed batches

use std::sync::Arc;

use crate::providers::EmbeddingProvider;

/// Splits texts into provider-sized batches and never fails the caller
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl BatchEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    /// Model dimensionality
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed `texts` in order; a batch that fails yields zero vectors
    pub async fn embed(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let dims = self.dimensions();
        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_num, batch) in texts.chunks(self.batch_size).enumerate() {
            match self.provider.embed_batch(batch).await {
                Ok(batch_vectors)
                    if batch_vectors.len() == batch.len()
                        && batch_vectors.iter().all(|v| v.len() == dims) =>
                {
                    vectors.extend(batch_vectors);
                }
                Ok(batch_vectors) => {
                    tracing::warn!(
                        "Embedding batch {} returned {} vectors for {} texts (expected dimension {}), substituting zero vectors",
                        batch_num,
                        batch_vectors.len(),
                        batch.len(),
                        dims
                    );
                    vectors.extend(std::iter::repeat(vec![0.0; dims]).take(batch.len()));
                }
                Err(e) => {
                    tracing::warn!(
                        "Embedding batch {} via {} failed: {}, substituting zero vectors",
                        batch_num,
                        self.provider.name(),
                        e
                    );
                    vectors.extend(std::iter::repeat(vec![0.0; dims]).take(batch.len()));
                }
            }
        }

        vectors
    }

    /// Embed a single query text
    pub async fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vectors = self.embed(&[text.to_string()]).await;
        vectors.pop().unwrap_or_else(|| vec![0.0; self.dimensions()])
    }
}

/// True when every component is zero
pub fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|v| *v == 0.0)
}

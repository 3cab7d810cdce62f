//! Embedding of chunks and queries.
//!
//! [`Embedder`] wraps an [`EmbeddingProvider`] with the call policy used
//! by the pipeline: fixed-size batches, a bounded number of batches in
//! flight, a per-call timeout and dimension checks.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use futures::stream::{self, StreamExt, TryStreamExt};
use statute_core::config::EmbeddingSettings;
use statute_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Provider plus batching, concurrency and timeout policy.
#[derive(Debug, Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    concurrency: usize,
    timeout: Duration,
}

impl Embedder {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        batch_size: usize,
        concurrency: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    pub fn from_settings(provider: Arc<dyn EmbeddingProvider>, settings: &EmbeddingSettings) -> Self {
        Self::new(
            provider,
            settings.batch_size,
            settings.concurrency,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Embed passages; the output is index-aligned with `texts` even though
    /// up to `concurrency` batches run at once.
    pub async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(self.batch_size))
            .map(|batch| self.embed_batch(batch))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    /// Embed a question.
    pub async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let vector = tokio::time::timeout(self.timeout, self.provider.embed(text))
            .await
            .map_err(|_| AppError::timeout("query embedding", self.timeout))??;

        self.check_dimensions(&vector)?;
        Ok(vector)
    }

    async fn embed_batch(&self, batch: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let vectors = tokio::time::timeout(self.timeout, self.provider.embed_many(batch))
            .await
            .map_err(|_| AppError::timeout("embedding batch", self.timeout))??;

        if vectors.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} vectors for {} texts",
                vectors.len(),
                batch.len()
            )));
        }
        for vector in &vectors {
            self.check_dimensions(vector)?;
        }

        tracing::debug!("Embedded batch of {}", batch.len());
        Ok(vectors)
    }

    fn check_dimensions(&self, vector: &[f32]) -> AppResult<()> {
        if vector.len() != self.provider.dimensions() {
            return Err(AppError::Embedding(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                vector.len(),
                self.provider.dimensions()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns `[index, 0, ..]` per text, sleeping longer for earlier batches.
    #[derive(Debug, Default)]
    struct SlowFirstProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for SlowFirstProvider {
        fn provider_name(&self) -> &str {
            "slow"
        }
        fn model_name(&self) -> &str {
            "slow-v1"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(call as u64 * 10))).await;
            Ok(texts
                .iter()
                .map(|t| vec![t.parse::<f32>().unwrap_or(-1.0), 0.0])
                .collect())
        }
    }

    #[derive(Debug)]
    struct WrongDims;

    #[async_trait::async_trait]
    impl EmbeddingProvider for WrongDims {
        fn provider_name(&self) -> &str {
            "wrong"
        }
        fn model_name(&self) -> &str {
            "wrong"
        }
        fn dimensions(&self) -> usize {
            4
        }
        async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0; 3]).collect())
        }
    }

    #[derive(Debug)]
    struct Hanging;

    #[async_trait::async_trait]
    impl EmbeddingProvider for Hanging {
        fn provider_name(&self) -> &str {
            "hanging"
        }
        fn model_name(&self) -> &str {
            "hanging"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_many(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_concurrent_batches_keep_input_order() {
        let provider = Arc::new(SlowFirstProvider::default());
        let embedder = Embedder::new(provider.clone(), 2, 4, Duration::from_secs(5));
        let texts: Vec<String> = (0..9).map(|i| i.to_string()).collect();

        let vectors = embedder.embed_many(&texts).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
        let firsts: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(firsts, (0..9).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_embedding_error() {
        let embedder = Embedder::new(Arc::new(WrongDims), 10, 1, Duration::from_secs(5));
        let result = embedder.embed_many(&["text".to_string()]).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_timeout() {
        let embedder = Embedder::new(Arc::new(Hanging), 10, 1, Duration::from_millis(20));
        let result = embedder.embed_query("question").await;
        assert!(matches!(result, Err(AppError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let provider = Arc::new(SlowFirstProvider::default());
        let embedder = Embedder::new(provider.clone(), 2, 2, Duration::from_secs(1));
        assert!(embedder.embed_many(&[]).await.unwrap().is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_embedding() {
        let embedder = Embedder::new(Arc::new(MockProvider::new(32)), 10, 1, Duration::from_secs(1));
        assert_eq!(embedder.embed_query("Article 1").await.unwrap().len(), 32);
    }
}

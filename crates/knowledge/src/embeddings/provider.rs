//! Embedding provider trait and factory.

use super::providers::{GeminiEmbeddingProvider, MockProvider, OllamaProvider};
use statute_core::config::EmbeddingSettings;
use statute_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers.
///
/// Every vector in one index must come from the same provider, model and
/// dimensionality. The persisted index records all three and is discarded
/// when any of them changes.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "gemini", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Embed document passages, one vector per input in input order.
    async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Embed a search query.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_many(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from configuration.
pub fn create_provider(
    settings: &EmbeddingSettings,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let timeout = Duration::from_secs(settings.timeout_secs);

    match settings.provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(settings.dimensions))),

        "ollama" => Ok(Arc::new(OllamaProvider::new(
            endpoint,
            &settings.model,
            settings.dimensions,
            timeout,
        )?)),

        "gemini" => {
            let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AppError::Config("Gemini embedding provider requires an API key".to_string())
            })?;
            Ok(Arc::new(GeminiEmbeddingProvider::new(
                endpoint,
                api_key,
                &settings.model,
                settings.dimensions,
                timeout,
            )?))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, ollama, mock",
            settings.provider
        ))),
    }
}

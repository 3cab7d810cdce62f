//! Stub providers and fixtures shared by the scenario tests.

use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::PipelineServices;
use statute_core::config::{ChunkingConfig, SplitterKind};
use statute_core::{AppConfig, AppError, AppResult};
use statute_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const NOT_AVAILABLE: &str = "The requested information is not available in the provided text.";

/// `n` short articles, one 50-character paragraph each.
pub fn statute(n: usize) -> String {
    (1..=n)
        .map(|i| format!("Article {i}: The contract is concluded by consent.\n\n"))
        .collect()
}

/// Offline configuration rooted at `workspace`.
pub fn test_config(workspace: &Path, chunk_size: usize, overlap: usize, dims: usize) -> AppConfig {
    let mut config = AppConfig {
        workspace: workspace.to_path_buf(),
        ..AppConfig::default()
    };
    config.chunking = ChunkingConfig {
        chunk_size,
        chunk_overlap: overlap,
        splitter: SplitterKind::Recursive,
    };
    config.embedding.provider = "mock".to_string();
    config.embedding.dimensions = dims;
    config.generation.provider = "ollama".to_string();
    config.generation.prompt = "legal.answer.en".to_string();
    config.index.persist = false;
    config
}

pub fn services(
    embedding: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
) -> PipelineServices {
    PipelineServices { embedding, llm }
}

/// Mock embeddings that count calls, optionally slowed down and failing
/// for a window of calls.
#[derive(Debug)]
pub struct CountingProvider {
    inner: MockProvider,
    dimensions: usize,
    pub calls: AtomicUsize,
    delay: Duration,
    fail_calls: std::ops::Range<usize>,
}

impl CountingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: MockProvider::new(dimensions),
            dimensions,
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail_calls: 0..0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the calls whose zero-based sequence number is in `calls`.
    pub fn failing(mut self, calls: std::ops::Range<usize>) -> Self {
        self.fail_calls = calls;
        self
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_many(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_calls.contains(&call) {
            return Err(AppError::Embedding("embedding service unavailable".to_string()));
        }
        self.inner.embed_many(texts).await
    }
}

/// Answers with the first context line sharing a keyword with the
/// question, or the not-available phrase. Stands in for a model that
/// follows the grounding directive.
#[derive(Default)]
pub struct GroundedLlm {
    pub calls: AtomicUsize,
}

impl GroundedLlm {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LlmClient for GroundedLlm {
    fn provider_name(&self) -> &str {
        "grounded-stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let system = request.system.as_deref().unwrap_or_default();
        let context = system.rsplit("Context:").next().unwrap_or_default();
        let keywords: Vec<String> = request
            .prompt
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 5)
            .map(str::to_lowercase)
            .collect();

        let content = context
            .lines()
            .map(str::trim)
            .find(|line| {
                let line = line.to_lowercase();
                keywords.iter().any(|k| line.contains(k.as_str()))
            })
            .map(str::to_string)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

/// Never answers within any reasonable deadline.
pub struct StalledLlm;

#[async_trait::async_trait]
impl LlmClient for StalledLlm {
    fn provider_name(&self) -> &str {
        "stalled-stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(LlmResponse {
            content: "too late".to_string(),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

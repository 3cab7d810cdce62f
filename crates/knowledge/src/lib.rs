//! Retrieval-augmented question answering over a single statutory text.
//!
//! Setup (`open_pipeline`, `build_pipeline`) loads the document, chunks it,
//! embeds every chunk into a vector index (or reloads a fresh persisted
//! index) and wires retrieval to grounded generation. Setup errors stop
//! construction; per-query errors come back as [`QueryFailure`]s.

pub mod cache;
pub mod chunk;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod generator;
pub mod index;
pub mod rag;
pub mod retriever;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use cache::PipelineCache;
pub use chunk::{Chunk, Chunker};
pub use document::Document;
pub use embeddings::{create_provider, Embedder, EmbeddingProvider};
pub use generator::AnswerGenerator;
pub use index::IndexFingerprint;
pub use rag::{Answer, AnswerReport, QueryFailure, QueryRun, QueryState, RagPipeline, RetryPolicy, SourceRef};
pub use retriever::Retriever;
pub use types::{BuildStats, IndexOrigin, IndexStats, PersistedIndexStats};
pub use vector_index::{MemoryIndex, ScoredChunk, VectorIndex};

use statute_core::{AppConfig, AppError, AppResult};
use statute_llm::{create_client, LlmClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// External services a pipeline calls.
#[derive(Clone)]
pub struct PipelineServices {
    pub embedding: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmClient>,
}

impl PipelineServices {
    /// Create the configured embedding provider and generation client.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedding_provider = &config.embedding.provider;
        let embedding = create_provider(
            &config.embedding,
            config.provider_endpoint(embedding_provider),
            config.resolve_api_key(embedding_provider).as_deref(),
        )?;

        let generation_provider = &config.generation.provider;
        let llm = create_client(
            generation_provider,
            config.provider_endpoint(generation_provider),
            config.resolve_api_key(generation_provider).as_deref(),
            Some(Duration::from_secs(config.generation.timeout_secs)),
        )
        .map_err(|e| AppError::Config(format!("Failed to create generation client: {}", e)))?;

        Ok(Self { embedding, llm })
    }
}

/// Validate the sections that shape a pipeline, without provider secrets.
pub fn validate_settings(config: &AppConfig) -> AppResult<()> {
    config.chunking.validate()?;
    config.retrieval.validate()?;
    config.embedding.validate()?;
    config.generation.validate()?;
    Ok(())
}

/// Load the configured document.
pub fn load_document(config: &AppConfig) -> AppResult<Arc<Document>> {
    let path = config.document_path();
    let document = Document::load(&path)?;
    tracing::info!(
        "Loaded {} ({} chars, hash {})",
        document.display_name(),
        document.char_len(),
        &document.content_hash()[..12.min(document.content_hash().len())]
    );
    Ok(Arc::new(document))
}

/// Build a pipeline for `document` with the given services.
///
/// Settings are validated before any chunking or embedding. A fresh
/// persisted index is reused unless `rebuild` is set.
pub async fn build_pipeline(
    config: &AppConfig,
    document: Arc<Document>,
    services: PipelineServices,
    rebuild: bool,
) -> AppResult<RagPipeline> {
    validate_settings(config)?;

    let embedder = Embedder::from_settings(services.embedding, &config.embedding);
    if embedder.dimensions() != config.embedding.dimensions {
        return Err(AppError::Config(format!(
            "Embedding provider '{}' produces {} dimensions, configuration says {}",
            embedder.provider().provider_name(),
            embedder.dimensions(),
            config.embedding.dimensions
        )));
    }

    let prompt = statute_prompt::load_prompt(&config.workspace, &config.generation.prompt)?;
    let (index, stats) = prepare_index(config, &document, &embedder, rebuild).await?;

    let retriever = Retriever::new(Arc::new(index), embedder, &config.retrieval)?;
    let generator = AnswerGenerator::new(services.llm, prompt, &config.generation);

    Ok(RagPipeline::new(document, retriever, generator)
        .with_retry(RetryPolicy::new(config.generation.max_attempts))
        .with_stats(stats))
}

/// Return the process-wide pipeline for the configured document, building
/// it on first use.
pub async fn open_pipeline(config: &AppConfig) -> AppResult<Arc<RagPipeline>> {
    config.validate()?;
    let document = load_document(config)?;
    let key = config::pipeline_key(config, &document)?;

    PipelineCache::global()
        .get_or_build(&key, || async {
            let services = PipelineServices::from_config(config)?;
            build_pipeline(config, document, services, false).await
        })
        .await
}

/// Build (or reuse) and persist the index for the configured document.
pub async fn build_index(config: &AppConfig, rebuild: bool) -> AppResult<BuildStats> {
    config.validate()?;
    let document = load_document(config)?;

    let provider = create_provider(
        &config.embedding,
        config.provider_endpoint(&config.embedding.provider),
        config.resolve_api_key(&config.embedding.provider).as_deref(),
    )?;
    let embedder = Embedder::from_settings(provider, &config.embedding);

    let (_, stats) = prepare_index(config, &document, &embedder, rebuild).await?;
    Ok(stats)
}

/// Report on the persisted index for the configured document.
pub fn index_stats(config: &AppConfig) -> AppResult<IndexStats> {
    validate_settings(config)?;
    let document = load_document(config)?;
    let path = config::get_index_path(config, &config.document_path());

    let persisted = index::read_stats(&path)?;
    let expected = IndexFingerprint::new(&document, &config.embedding, &config.chunking);
    let fresh = persisted
        .as_ref()
        .is_some_and(|p| p.fingerprint == expected);

    Ok(IndexStats {
        document: config.document_path(),
        content_hash: document.content_hash().to_string(),
        document_chars: document.char_len(),
        persisted,
        fresh,
    })
}

/// Load a fresh persisted index or chunk, embed and persist a new one.
async fn prepare_index(
    config: &AppConfig,
    document: &Arc<Document>,
    embedder: &Embedder,
    rebuild: bool,
) -> AppResult<(MemoryIndex, BuildStats)> {
    let start = Instant::now();
    let chunker = Chunker::new(config.chunking.clone())?;
    let fingerprint = IndexFingerprint::new(document, &config.embedding, &config.chunking);

    let index_path: Option<PathBuf> = match document.source() {
        Some(source) if config.index.persist => Some(config::get_index_path(config, source)),
        _ => None,
    };

    let mut loaded = None;
    if let (Some(path), false) = (&index_path, rebuild) {
        match index::load_index(path, &fingerprint, document) {
            Ok(found) => loaded = found,
            Err(e) => tracing::warn!("Ignoring unreadable index at {:?}: {}", path, e),
        }
    }

    let (index, origin) = match loaded {
        Some(index) => (index, IndexOrigin::Loaded),
        None => {
            let chunks = chunker.split(document)?;
            tracing::info!(
                "Split {} into {} chunks (size {}, overlap {}, {} splitter)",
                document.display_name(),
                chunks.len(),
                config.chunking.chunk_size,
                config.chunking.chunk_overlap,
                chunker.splitter_name()
            );

            let index = MemoryIndex::build(chunks, embedder).await?;
            if let Some(ref path) = index_path {
                if let Err(e) = index::save_index(path, &fingerprint, &index) {
                    tracing::warn!("Failed to persist index to {:?}: {}", path, e);
                }
            }
            (index, IndexOrigin::Built)
        }
    };

    let stats = BuildStats {
        document: document.display_name(),
        content_hash: document.content_hash().to_string(),
        chunks: index.len(),
        dimensions: index.dimensions(),
        origin,
        index_path,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Ok((index, stats))
}

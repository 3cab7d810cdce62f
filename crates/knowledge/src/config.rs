//! Derived paths and cache keys for a configured pipeline.

use crate::document::{calculate_hash, Document};
use serde::Serialize;
use statute_core::config::{
    ChunkingConfig, EmbeddingSettings, GenerationSettings, RetrievalConfig,
};
use statute_core::{AppConfig, AppResult};
use std::path::{Path, PathBuf};

/// Get the SQLite index path for a document: `<index dir>/<stem>.sqlite`.
pub fn get_index_path(config: &AppConfig, document: &Path) -> PathBuf {
    let stem = document
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());

    let safe: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    config.index_dir().join(format!("{}.sqlite", safe))
}

#[derive(Serialize)]
struct KeyParts<'a> {
    content_hash: &'a str,
    chunking: &'a ChunkingConfig,
    retrieval: &'a RetrievalConfig,
    embedding: &'a EmbeddingSettings,
    generation: &'a GenerationSettings,
    endpoints: (Option<&'a str>, Option<&'a str>),
}

/// Cache key for the pipeline built from `document` under `config`.
///
/// Equal keys mean an identical document and identical build settings.
pub fn pipeline_key(config: &AppConfig, document: &Document) -> AppResult<String> {
    let parts = KeyParts {
        content_hash: document.content_hash(),
        chunking: &config.chunking,
        retrieval: &config.retrieval,
        embedding: &config.embedding,
        generation: &config.generation,
        endpoints: (
            config.provider_endpoint(&config.embedding.provider),
            config.provider_endpoint(&config.generation.provider),
        ),
    };
    let json = serde_json::to_string(&parts)?;
    Ok(calculate_hash(&json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_path_uses_document_stem() {
        let config = AppConfig::default();
        let path = get_index_path(&config, Path::new("/data/law.txt"));
        assert!(path.ends_with(".statute/index/law.sqlite"));

        let odd = get_index_path(&config, Path::new("/data/قانون الأحوال.txt"));
        assert!(odd.to_string_lossy().ends_with("قانون_الأحوال.sqlite"));
    }

    #[test]
    fn test_pipeline_key_tracks_content_and_settings() {
        let config = AppConfig::default();
        let a = Document::from_text("Article 1: one.");
        let b = Document::from_text("Article 1: two.");

        let key_a = pipeline_key(&config, &a).unwrap();
        assert_eq!(key_a, pipeline_key(&config, &Document::from_text("Article 1: one.")).unwrap());
        assert_ne!(key_a, pipeline_key(&config, &b).unwrap());

        let mut other = config.clone();
        other.retrieval.top_k = 3;
        assert_ne!(key_a, pipeline_key(&other, &a).unwrap());
    }
}

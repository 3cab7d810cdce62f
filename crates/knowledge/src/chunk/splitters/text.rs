//! Semantic splitter using the text-splitter crate.

use super::ChunkSplitter;
use statute_core::config::ChunkingConfig;
use statute_core::{AppError, AppResult};
use std::ops::Range;
use text_splitter::{ChunkConfig as SplitterConfig, TextSplitter};

/// Unicode-aware splitter (sentences, words, graphemes) from `text-splitter`.
pub struct SemanticSplitter;

impl ChunkSplitter for SemanticSplitter {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn split_spans(&self, text: &str, config: &ChunkingConfig) -> AppResult<Vec<Range<usize>>> {
        let splitter_config = SplitterConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| AppError::Config(format!("Invalid splitter configuration: {}", e)))?
            .with_trim(false);

        let splitter = TextSplitter::new(splitter_config);

        Ok(splitter
            .chunk_indices(text)
            .filter(|(_, chunk)| !chunk.is_empty())
            .map(|(offset, chunk)| offset..offset + chunk.len())
            .collect())
    }
}

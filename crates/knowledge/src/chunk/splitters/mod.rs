//! Splitter implementations.

mod recursive;
mod text;

pub use recursive::{RecursiveSplitter, SEPARATORS};
pub use text::SemanticSplitter;

use statute_core::config::ChunkingConfig;
use statute_core::AppResult;
use std::ops::Range;

/// Trait for chunk splitters.
///
/// Implementations return ordered, non-overlapping-in-start byte spans on
/// char boundaries, each at most `chunk_size` characters long.
pub trait ChunkSplitter: Send + Sync {
    fn name(&self) -> &'static str;

    fn split_spans(&self, text: &str, config: &ChunkingConfig) -> AppResult<Vec<Range<usize>>>;
}

//! Chunking of the statutory text into overlapping, ordered segments.
//!
//! A [`Chunk`] is a byte span into a shared [`Document`]; the text is never
//! copied. Chunks are created only here (and when a persisted index is
//! reloaded against the same document).

pub mod splitters;

use crate::document::Document;
use splitters::{ChunkSplitter, RecursiveSplitter, SemanticSplitter};
use statute_core::config::{ChunkingConfig, SplitterKind};
use statute_core::AppResult;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// A contiguous substring of a [`Document`].
#[derive(Clone)]
pub struct Chunk {
    document: Arc<Document>,
    position: usize,
    start: usize,
    end: usize,
}

impl Chunk {
    pub(crate) fn new(document: Arc<Document>, position: usize, span: Range<usize>) -> Self {
        Self {
            document,
            position,
            start: span.start,
            end: span.end,
        }
    }

    /// Chunk text, borrowed from the document.
    pub fn text(&self) -> &str {
        &self.document.text()[self.start..self.end]
    }

    /// Index of the chunk in document order (0-based).
    pub fn position(&self) -> usize {
        self.position
    }

    /// Byte span in the document.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    /// 1-based inclusive line range covered by the chunk.
    pub fn line_range(&self) -> (usize, usize) {
        let text = self.document.text();
        let first = text[..self.start].matches('\n').count() + 1;
        let body = self.text().trim_end_matches('\n');
        (first, first + body.matches('\n').count())
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.start == other.start
            && self.end == other.end
            && self.document.content_hash() == other.document.content_hash()
    }
}

impl Eq for Chunk {}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("position", &self.position)
            .field("span", &(self.start..self.end))
            .field("text", &self.text())
            .finish()
    }
}

/// Splits documents with a validated configuration.
pub struct Chunker {
    config: ChunkingConfig,
    splitter: Box<dyn ChunkSplitter>,
}

impl Chunker {
    /// Validate the configuration and select the splitter.
    ///
    /// Fails with `AppError::Config` when `chunk_size == 0` or
    /// `overlap >= chunk_size`.
    pub fn new(config: ChunkingConfig) -> AppResult<Self> {
        config.validate()?;

        let splitter: Box<dyn ChunkSplitter> = match config.splitter {
            SplitterKind::Recursive => Box::new(RecursiveSplitter),
            SplitterKind::Semantic => Box::new(SemanticSplitter),
        };

        Ok(Self { config, splitter })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn splitter_name(&self) -> &'static str {
        self.splitter.name()
    }

    /// Split a document into ordered chunks. An empty document yields none.
    pub fn split(&self, document: &Arc<Document>) -> AppResult<Vec<Chunk>> {
        let spans = self.splitter.split_spans(document.text(), &self.config)?;

        let chunks: Vec<Chunk> = spans
            .into_iter()
            .filter(|span| !span.is_empty())
            .enumerate()
            .map(|(position, span)| Chunk::new(Arc::clone(document), position, span))
            .collect();

        tracing::debug!(
            splitter = self.splitter.name(),
            chunks = chunks.len(),
            bytes = document.text().len(),
            "Split document"
        );

        Ok(chunks)
    }
}

/// Split with the recursive boundary splitter.
pub fn split(document: &Arc<Document>, chunk_size: usize, overlap: usize) -> AppResult<Vec<Chunk>> {
    Chunker::new(ChunkingConfig {
        chunk_size,
        chunk_overlap: overlap,
        splitter: SplitterKind::Recursive,
    })?
    .split(document)
}

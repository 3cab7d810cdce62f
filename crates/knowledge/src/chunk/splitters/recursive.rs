//! Boundary back-off splitter.
//!
//! Fills a window of `chunk_size` characters, then cuts after the last
//! paragraph break in the window, else the last line break, else the last
//! period, else the last space, else at the window edge. The separator stays
//! at the end of the chunk it closes. The next chunk starts `overlap`
//! characters before the cut, moved forward to the next word start when one
//! exists inside the overlap.

use super::ChunkSplitter;
use statute_core::config::ChunkingConfig;
use statute_core::AppResult;
use std::ops::Range;

/// Boundaries in priority order.
pub const SEPARATORS: [&str; 4] = ["\n\n", "\n", ".", " "];

pub struct RecursiveSplitter;

/// Char-index to byte-offset table.
struct CharIndex<'a> {
    text: &'a str,
    offsets: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    fn new(text: &'a str) -> Self {
        let offsets = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, offsets }
    }

    fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn byte(&self, char_idx: usize) -> usize {
        self.offsets[char_idx]
    }

    fn slice(&self, from: usize, to: usize) -> &'a str {
        &self.text[self.byte(from)..self.byte(to)]
    }

    fn is_whitespace_at(&self, char_idx: usize) -> bool {
        self.slice(char_idx, char_idx + 1)
            .chars()
            .all(char::is_whitespace)
    }
}

impl RecursiveSplitter {
    /// Char index at which to end a chunk starting at `start`.
    fn find_cut(index: &CharIndex<'_>, start: usize, window_end: usize, overlap: usize) -> usize {
        let window = index.slice(start, window_end);

        for separator in SEPARATORS {
            if let Some(found) = window.rfind(separator) {
                let cut_bytes = found + separator.len();
                let cut = start + window[..cut_bytes].chars().count();
                // Later occurrences were already tried; earlier ones are shorter
                if cut - start > overlap {
                    return cut;
                }
            }
        }

        window_end
    }

    /// Char index where the chunk after `[prev_start, end)` begins.
    fn next_start(index: &CharIndex<'_>, prev_start: usize, end: usize, overlap: usize) -> usize {
        let raw = end.saturating_sub(overlap).max(prev_start + 1);
        if raw >= end || raw == 0 || index.is_whitespace_at(raw - 1) {
            return raw;
        }

        (raw..end)
            .find(|&i| index.is_whitespace_at(i))
            .map(|i| i + 1)
            .filter(|&next| next < end)
            .unwrap_or(raw)
    }
}

impl ChunkSplitter for RecursiveSplitter {
    fn name(&self) -> &'static str {
        "recursive"
    }

    fn split_spans(&self, text: &str, config: &ChunkingConfig) -> AppResult<Vec<Range<usize>>> {
        config.validate()?;

        let size = config.chunk_size;
        let overlap = config.chunk_overlap;
        let index = CharIndex::new(text);
        let total = index.len();

        let mut spans = Vec::new();
        let mut start = 0;

        while start < total {
            let window_end = (start + size).min(total);
            let end = if window_end == total {
                total
            } else {
                Self::find_cut(&index, start, window_end, overlap)
            };

            spans.push(index.byte(start)..index.byte(end));

            if end == total {
                break;
            }
            start = Self::next_start(&index, start, end, overlap);
        }

        Ok(spans)
    }
}

//! Vector index over document chunks.
//!
//! The index is built once and is read-only afterwards, so concurrent
//! searches need no locking.

use crate::chunk::Chunk;
use crate::embeddings::Embedder;
use statute_core::{AppError, AppResult};
use std::time::Instant;

/// A retrieved chunk and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Return at most `k` chunks by descending similarity, ties broken by
    /// chunk position.
    ///
    /// Fails with `AppError::Config` when `k == 0` and with
    /// `AppError::Embedding` when the query has the wrong dimensionality.
    /// An empty index always returns an empty result.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredChunk>>;

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality shared by every stored vector.
    fn dimensions(&self) -> usize;
}

struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
    norm: f32,
}

/// In-memory exhaustive cosine index.
pub struct MemoryIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl MemoryIndex {
    /// Embed every chunk exactly once and build the index.
    pub async fn build(chunks: Vec<Chunk>, embedder: &Embedder) -> AppResult<Self> {
        let start = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.text().to_string()).collect();
        let vectors = embedder.embed_many(&texts).await?;

        let index = Self::from_entries(chunks.into_iter().zip(vectors), embedder.dimensions())?;

        tracing::info!(
            "Built vector index: {} entries, {} dimensions in {:.2}s",
            index.len(),
            index.dimensions,
            start.elapsed().as_secs_f64()
        );
        Ok(index)
    }

    /// Assemble an index from already-embedded chunks, in chunk order.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Chunk, Vec<f32>)>,
        dimensions: usize,
    ) -> AppResult<Self> {
        let entries = entries
            .into_iter()
            .map(|(chunk, vector)| {
                if vector.len() != dimensions {
                    return Err(AppError::Index(format!(
                        "Chunk {} has {} dimensions, index expects {}",
                        chunk.position(),
                        vector.len(),
                        dimensions
                    )));
                }
                let norm = l2_norm(&vector);
                Ok(IndexEntry {
                    chunk,
                    vector,
                    norm,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            entries,
            dimensions,
        })
    }

    /// Stored (chunk, vector) pairs in chunk order.
    pub fn entries(&self) -> impl Iterator<Item = (&Chunk, &[f32])> {
        self.entries.iter().map(|e| (&e.chunk, e.vector.as_slice()))
    }
}

impl VectorIndex for MemoryIndex {
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(AppError::Config("k must be at least 1".to_string()));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Query has {} dimensions, index expects {}",
                query.len(),
                self.dimensions
            )));
        }

        let query_norm = l2_norm(query);
        let mut results: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_with_norms(query, query_norm, &entry.vector, entry.norm),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.position().cmp(&b.chunk.position()))
        });
        results.truncate(k);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{})",
            results.len(),
            k
        );
        Ok(results)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_with_norms(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let score = dot / (norm_a * norm_b);
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk;
    use crate::document::Document;
    use std::sync::Arc;

    fn chunks(n: usize) -> Vec<Chunk> {
        let text: String = (0..n).map(|i| format!("part{:02}\n\n", i)).collect();
        let document = Arc::new(Document::from_text(text));
        let chunks = chunk::split(&document, 8, 0).unwrap();
        assert_eq!(chunks.len(), n);
        chunks
    }

    fn index(vectors: Vec<Vec<f32>>) -> MemoryIndex {
        let dims = vectors[0].len();
        MemoryIndex::from_entries(chunks(vectors.len()).into_iter().zip(vectors), dims).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_ranks_descending_with_stable_ties() {
        let index = index(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.6, 0.8],
            vec![1.0, 0.0],
        ]);

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let positions: Vec<usize> = results.iter().map(|r| r.chunk.position()).collect();
        assert_eq!(positions, vec![1, 3, 2]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_top_k_bound() {
        let index = index(vec![vec![1.0, 0.0]; 5]);
        assert_eq!(index.search(&[1.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[1.0, 0.0], 50).unwrap().len(), 5);
    }

    #[test]
    fn test_search_k_zero_is_config_error() {
        let index = index(vec![vec![1.0, 0.0]]);
        assert!(matches!(index.search(&[1.0, 0.0], 0), Err(AppError::Config(_))));

        let empty = MemoryIndex::from_entries(Vec::new(), 2).unwrap();
        assert!(matches!(empty.search(&[1.0, 0.0], 0), Err(AppError::Config(_))));
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let empty = MemoryIndex::from_entries(Vec::new(), 3).unwrap();
        assert!(empty.is_empty());
        assert!(empty.search(&[1.0, 0.0, 0.0], 8).unwrap().is_empty());
        // Even a malformed query is not an error against an empty index
        assert!(empty.search(&[1.0], 8).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = index(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(AppError::Embedding(_))
        ));
    }

    #[test]
    fn test_from_entries_rejects_mixed_dimensions() {
        let chunks = chunks(2);
        let result = MemoryIndex::from_entries(
            chunks.into_iter().zip(vec![vec![1.0, 0.0], vec![1.0]]),
            2,
        );
        assert!(matches!(result, Err(AppError::Index(_))));
    }

    #[test]
    fn test_repeated_search_is_deterministic() {
        let index = index(vec![vec![0.3, 0.7], vec![0.9, 0.1], vec![0.5, 0.5]]);
        let a = index.search(&[0.4, 0.6], 3).unwrap();
        let b = index.search(&[0.4, 0.6], 3).unwrap();
        assert_eq!(a, b);
    }
}

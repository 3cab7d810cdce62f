//! Question-to-chunks retrieval.

use crate::embeddings::Embedder;
use crate::vector_index::{ScoredChunk, VectorIndex};
use statute_core::config::RetrievalConfig;
use statute_core::{AppError, AppResult};
use std::sync::Arc;

/// Embeds a question and returns the `top_k` most similar chunks.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Embedder,
    top_k: usize,
    min_score: Option<f32>,
}

impl Retriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Embedder,
        config: &RetrievalConfig,
    ) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            index,
            embedder,
            top_k: config.top_k,
            min_score: config.min_score,
        })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Retrieve context for `question`, best match first.
    ///
    /// When a minimum score is configured, weaker matches are dropped and
    /// the result may be empty.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<ScoredChunk>> {
        if question.trim().is_empty() {
            return Err(AppError::InvalidInput("question is empty".to_string()));
        }

        let query = self.embedder.embed_query(question).await?;
        let mut results = self.index.search(&query, self.top_k)?;

        if let Some(min_score) = self.min_score {
            let before = results.len();
            results.retain(|r| r.score >= min_score);
            if results.len() < before {
                tracing::debug!(
                    "Dropped {} chunks below min score {:.2}",
                    before - results.len(),
                    min_score
                );
            }
        }

        if let Some(best) = results.first() {
            tracing::debug!(
                "Best match: chunk {} (score {:.3})",
                best.chunk.position(),
                best.score
            );
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk;
    use crate::document::Document;
    use crate::embeddings::providers::MockProvider;
    use crate::vector_index::MemoryIndex;
    use std::time::Duration;

    async fn retriever(top_k: usize, min_score: Option<f32>) -> Retriever {
        let document = Arc::new(Document::from_text(
            "Article 1: the dowry is owed to the wife.\n\n\
             Article 2: custody belongs to the mother.\n\n\
             Article 3: inheritance shares are fixed by law.",
        ));
        let chunks = chunk::split(&document, 50, 0).unwrap();
        let embedder = Embedder::new(Arc::new(MockProvider::new(128)), 8, 1, Duration::from_secs(5));
        let index = MemoryIndex::build(chunks, &embedder).await.unwrap();

        Retriever::new(
            Arc::new(index),
            embedder,
            &RetrievalConfig { top_k, min_score },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_best_match_first() {
        let retriever = retriever(2, None).await;
        let results = retriever.retrieve("who has custody of the children").await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].chunk.text().contains("custody"));
    }

    #[tokio::test]
    async fn test_min_score_filters() {
        let retriever = retriever(3, Some(0.99)).await;
        let results = retriever.retrieve("maritime shipping insurance").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let retriever = retriever(3, None).await;
        assert!(matches!(
            retriever.retrieve("   ").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let embedder = Embedder::new(Arc::new(MockProvider::new(8)), 8, 1, Duration::from_secs(5));
        let index = Arc::new(MemoryIndex::from_entries(Vec::new(), 8).unwrap());
        let result = Retriever::new(
            index,
            embedder,
            &RetrievalConfig {
                top_k: 0,
                min_score: None,
            },
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

//! Per-query orchestration.
//!
//! Each question runs through a fresh [`QueryRun`]:
//! `Idle -> Retrieving -> Generating -> Done`, or `Failed` from any
//! active state. Nothing is carried over between questions.

use crate::document::Document;
use crate::generator::AnswerGenerator;
use crate::rag::types::{Answer, QueryFailure, QueryState};
use crate::retriever::Retriever;
use crate::types::BuildStats;
use crate::vector_index::ScoredChunk;
use statute_core::{AppError, AppResult, ErrorKind};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Bounded retry of the idempotent retrieval and generation steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    fn is_retryable(err: &AppError) -> bool {
        matches!(
            err.kind(),
            ErrorKind::Embedding | ErrorKind::Generation | ErrorKind::Timeout
        )
    }

    async fn run<T, F, Fut>(&self, step: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && Self::is_retryable(&e) => {
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        step,
                        attempt,
                        self.max_attempts,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// State history of one query.
#[derive(Debug, Clone)]
pub struct QueryRun {
    state: QueryState,
    history: Vec<&'static str>,
}

impl QueryRun {
    fn new() -> Self {
        Self {
            state: QueryState::Idle,
            history: vec![QueryState::Idle.name()],
        }
    }

    fn advance(&mut self, next: QueryState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state.name(),
            next.name()
        );
        tracing::debug!("Query state: {} -> {}", self.state.name(), next.name());
        self.history.push(next.name());
        self.state = next;
    }

    fn fail(&mut self, err: AppError) {
        tracing::warn!("Query failed while {}: {}", self.state.name(), err);
        self.advance(QueryState::Failed(err.into()));
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Names of every state visited, in order.
    pub fn history(&self) -> &[&'static str] {
        &self.history
    }

    pub fn into_result(self) -> Result<Answer, QueryFailure> {
        match self.state {
            QueryState::Done(answer) => Ok(answer),
            QueryState::Failed(failure) => Err(failure),
            other => Err(QueryFailure {
                kind: ErrorKind::Other,
                message: format!("query stopped in state {}", other.name()),
            }),
        }
    }
}

/// A constructed, queryable pipeline. Cheap to share behind an `Arc`.
pub struct RagPipeline {
    document: Arc<Document>,
    retriever: Retriever,
    generator: AnswerGenerator,
    retry: RetryPolicy,
    stats: Option<BuildStats>,
}

impl RagPipeline {
    pub fn new(document: Arc<Document>, retriever: Retriever, generator: AnswerGenerator) -> Self {
        Self {
            document,
            retriever,
            generator,
            retry: RetryPolicy::default(),
            stats: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn with_stats(mut self, stats: BuildStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    /// Statistics from the build that produced this pipeline.
    pub fn stats(&self) -> Option<&BuildStats> {
        self.stats.as_ref()
    }

    /// Answer `question`, or return a structured failure.
    pub async fn ask(&self, question: &str) -> Result<Answer, QueryFailure> {
        self.execute(question).await.into_result()
    }

    /// Run one question through the state machine and return the full run.
    pub async fn execute(&self, question: &str) -> QueryRun {
        let span = tracing::info_span!("ask", chars = question.chars().count());
        self.execute_inner(question).instrument(span).await
    }

    async fn execute_inner(&self, question: &str) -> QueryRun {
        let mut run = QueryRun::new();

        let question = question.trim();
        if question.is_empty() {
            run.fail(AppError::InvalidInput("question is empty".to_string()));
            return run;
        }

        run.advance(QueryState::Retrieving);
        let retrieved: Vec<ScoredChunk> = match self
            .retry
            .run("Retrieval", || self.retriever.retrieve(question))
            .await
        {
            Ok(retrieved) => retrieved,
            Err(e) => {
                run.fail(e);
                return run;
            }
        };

        let max_score = retrieved.first().map(|r| r.score);
        let sources: Vec<_> = retrieved.into_iter().map(|r| r.chunk).collect();

        run.advance(QueryState::Generating);
        match self
            .retry
            .run("Generation", || self.generator.generate(question, &sources))
            .await
        {
            Ok(answer) => {
                tracing::info!(
                    "Answered with {} context chunks (max score: {})",
                    sources.len(),
                    max_score.map_or("n/a".to_string(), |s| format!("{:.3}", s))
                );
                run.advance(QueryState::Done(Answer {
                    answer,
                    sources,
                    max_score,
                }));
            }
            Err(e) => run.fail(e),
        }

        run
    }
}

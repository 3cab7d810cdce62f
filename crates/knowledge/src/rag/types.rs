//! RAG response and query-state types.

use crate::chunk::Chunk;
use serde::{Deserialize, Serialize};
use statute_core::{AppError, ErrorKind};
use std::fmt;

/// Maximum snippet length for source references, in characters.
pub const MAX_SNIPPET_CHARS: usize = 150;

/// Answer to a single question.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Model answer, or the not-available phrase
    pub answer: String,

    /// Chunks supplied as context, best match first
    pub sources: Vec<Chunk>,

    /// Highest retrieval score, if anything was retrieved
    pub max_score: Option<f32>,
}

impl Answer {
    /// Human-readable references for the context chunks.
    pub fn source_refs(&self) -> Vec<SourceRef> {
        self.sources.iter().map(SourceRef::from_chunk).collect()
    }
}

/// A single source reference shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Document name (e.g., "law.txt")
    pub source: String,

    /// Chunk position within the document
    pub position: usize,

    /// Human-readable location, e.g. "lines 12-34"
    pub location: String,

    /// Short snippet showing the relevant evidence (truncated if needed)
    pub snippet: String,
}

impl SourceRef {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        let (first, last) = chunk.line_range();
        let location = if first == last {
            format!("line {}", first)
        } else {
            format!("lines {}-{}", first, last)
        };

        Self {
            source: chunk.document().display_name(),
            position: chunk.position(),
            location,
            snippet: truncate_snippet(chunk.text(), MAX_SNIPPET_CHARS),
        }
    }
}

/// Serializable form of an [`Answer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerReport {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

impl From<&Answer> for AnswerReport {
    fn from(answer: &Answer) -> Self {
        Self {
            answer: answer.answer.clone(),
            sources: answer.source_refs(),
        }
    }
}

/// A per-query failure surfaced to the caller instead of a crash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl QueryFailure {
    /// Marked message for display; never equal to an answer text.
    pub fn user_message(&self) -> String {
        format!("⚠ Error ({}): {}", self.kind, self.message)
    }
}

impl From<AppError> for QueryFailure {
    fn from(err: AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for QueryFailure {}

/// States of a single query.
#[derive(Debug, Clone)]
pub enum QueryState {
    Idle,
    Retrieving,
    Generating,
    Done(Answer),
    Failed(QueryFailure),
}

impl QueryState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Retrieving => "retrieving",
            Self::Generating => "generating",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: &QueryState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Retrieving)
                | (Self::Idle, Self::Failed(_))
                | (Self::Retrieving, Self::Generating)
                | (Self::Retrieving, Self::Failed(_))
                | (Self::Generating, Self::Done(_))
                | (Self::Generating, Self::Failed(_))
        )
    }
}

/// Truncate snippet to at most `max_chars` characters, at a word boundary
/// where possible.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let truncated = &text[..cut];

    match truncated.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => format!("{}...", truncated[..last_space].trim_end()),
        _ => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk;
    use crate::document::Document;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_user_message_is_marked() {
        let failure = QueryFailure::from(AppError::timeout("answer generation", Duration::from_secs(2)));

        assert_eq!(failure.kind, ErrorKind::Timeout);
        assert_eq!(
            failure.user_message(),
            "⚠ Error (timeout): Timeout: answer generation did not complete within 2.0s"
        );
        assert_eq!(failure.to_string(), failure.user_message());
    }

    #[test]
    fn test_transitions() {
        assert!(QueryState::Idle.can_transition_to(&QueryState::Retrieving));
        assert!(QueryState::Retrieving.can_transition_to(&QueryState::Generating));
        assert!(!QueryState::Idle.can_transition_to(&QueryState::Generating));
        assert!(!QueryState::Generating.can_transition_to(&QueryState::Retrieving));

        let failed = QueryState::Failed(AppError::Embedding("down".to_string()).into());
        assert!(QueryState::Retrieving.can_transition_to(&failed));
        assert!(failed.is_terminal());
        assert!(!failed.can_transition_to(&QueryState::Idle));
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("Short text", 100), "Short text");

        let long = "This is a very long text that needs to be truncated at some point";
        let result = truncate_snippet(long, 30);
        assert!(result.chars().count() <= 33);
        assert!(result.ends_with("..."));

        let arabic = "المادة الأولى يشترط لصحة الزواج الإيجاب والقبول".repeat(5);
        assert!(truncate_snippet(&arabic, 20).chars().count() <= 23);
    }

    #[test]
    fn test_source_refs() {
        let document = Arc::new(Document::from_text("Article 1: first.\nArticle 2: second.\n\nArticle 3: third."));
        let chunks = chunk::split(&document, 40, 0).unwrap();
        let answer = Answer {
            answer: "text".to_string(),
            sources: chunks,
            max_score: Some(0.9),
        };

        let refs = answer.source_refs();
        assert_eq!(refs[0].source, "<memory>");
        assert_eq!(refs[0].position, 0);
        assert!(refs[0].location.starts_with("line"));
        assert!(refs[0].snippet.starts_with("Article 1"));
    }
}

//! Error types for statute.
//!
//! This module defines a unified error enum covering the setup-time failures
//! (configuration, missing source document) and the per-query failures
//! (embedding, generation, timeouts) of the retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for statute.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic; errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid parameters (chunking, retrieval, provider settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source document is missing or unreadable
    #[error("Source unavailable: {path:?}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider failures
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Generative model failures (auth, quota, malformed response)
    #[error("Generation error: {0}")]
    Generation(String),

    /// An external call exceeded its deadline
    #[error("Timeout: {operation} did not complete within {seconds:.1}s")]
    Timeout { operation: String, seconds: f64 },

    /// Vector index build, search, or persistence errors
    #[error("Index error: {0}")]
    Index(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Rejected query input (e.g. blank question)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`AppError`], surfaced to callers in
/// structured query failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    SourceUnavailable,
    Io,
    Embedding,
    Generation,
    Timeout,
    Index,
    Prompt,
    InvalidInput,
    Serialization,
    Other,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::SourceUnavailable => "source_unavailable",
            Self::Io => "io",
            Self::Embedding => "embedding",
            Self::Generation => "generation",
            Self::Timeout => "timeout",
            Self::Index => "index",
            Self::Prompt => "prompt",
            Self::InvalidInput => "invalid_input",
            Self::Serialization => "serialization",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            Self::Io(_) => ErrorKind::Io,
            Self::Embedding(_) => ErrorKind::Embedding,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Index(_) => ErrorKind::Index,
            Self::Prompt(_) => ErrorKind::Prompt,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Errors that must stop pipeline construction.
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::SourceUnavailable { .. })
    }

    /// Build a timeout error for `operation` after `after` elapsed.
    pub fn timeout(operation: impl Into<String>, after: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds: after.as_secs_f64(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

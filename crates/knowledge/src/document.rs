//! Source document loading.

use sha2::{Digest, Sha256};
use statute_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// An immutable statutory text loaded once at startup.
#[derive(Debug)]
pub struct Document {
    text: String,
    source: Option<PathBuf>,
    content_hash: String,
}

impl Document {
    /// Read a UTF-8 document from disk.
    ///
    /// A missing, unreadable or non-UTF-8 file is reported as
    /// `AppError::SourceUnavailable`.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = ?path, bytes = text.len(), "Loaded document");
        Ok(Self::new(text, Some(path.to_path_buf())))
    }

    /// Wrap in-memory text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(text.into(), None)
    }

    fn new(text: String, source: Option<PathBuf>) -> Self {
        let content_hash = calculate_hash(&text);
        Self {
            text,
            source,
            content_hash,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Hex SHA-256 of the text; identifies the content for caching and
    /// persisted-index staleness checks.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// File name of the source, or `"<memory>"`.
    pub fn display_name(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Calculate SHA-256 hash of text.
pub fn calculate_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

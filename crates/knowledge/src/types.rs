//! Knowledge system type definitions.

use crate::index::IndexFingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the vector index used by a pipeline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrigin {
    /// Embedded from scratch in this process
    Built,
    /// Reloaded from a fresh persisted index
    Loaded,
}

/// Statistics from building (or loading) a pipeline's index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Display name of the source document
    pub document: String,

    /// SHA-256 of the document text
    pub content_hash: String,

    /// Number of chunks in the index
    pub chunks: usize,

    /// Embedding dimensionality
    pub dimensions: usize,

    pub origin: IndexOrigin,

    /// Where the index is persisted, if persistence is enabled
    pub index_path: Option<PathBuf>,

    /// Wall time spent chunking, embedding and persisting
    pub duration_ms: u64,
}

/// Statistics read from a persisted index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedIndexStats {
    pub path: PathBuf,
    pub fingerprint: IndexFingerprint,
    pub built_at: DateTime<Utc>,
    pub chunks: usize,
    pub file_size: u64,
}

/// Index status for the configured document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub document: PathBuf,

    /// Hash of the document as it is on disk now
    pub content_hash: String,

    pub document_chars: usize,

    /// Persisted index, if one exists
    pub persisted: Option<PersistedIndexStats>,

    /// True when the persisted index matches the current document and settings
    pub fresh: bool,
}

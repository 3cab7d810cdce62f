//! SQLite persistence for the vector index.
//!
//! One file per document. A manifest row records the fingerprint the index
//! was built from; a load whose fingerprint no longer matches is treated as
//! absent so the caller rebuilds.

use crate::chunk::Chunk;
use crate::document::Document;
use crate::types::PersistedIndexStats;
use crate::vector_index::MemoryIndex;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use statute_core::config::{ChunkingConfig, EmbeddingSettings};
use statute_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Bumped whenever the on-disk layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Everything a persisted index depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFingerprint {
    pub format_version: u32,
    pub content_hash: String,
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub splitter: String,
}

impl IndexFingerprint {
    pub fn new(
        document: &Document,
        embedding: &EmbeddingSettings,
        chunking: &ChunkingConfig,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            content_hash: document.content_hash().to_string(),
            provider: embedding.provider.clone(),
            model: embedding.model.clone(),
            dimensions: embedding.dimensions,
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            splitter: chunking.splitter.as_str().to_string(),
        }
    }
}

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> AppError + '_ {
    move |e| AppError::Index(format!("{}: {}", context, e))
}

/// Open (creating if needed) the index database.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path).map_err(db_err("Failed to open SQLite index"))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS manifest (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            fingerprint TEXT NOT NULL,
            built_at TEXT NOT NULL,
            chunk_count INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS entries (
            position INTEGER PRIMARY KEY,
            start_byte INTEGER NOT NULL,
            end_byte INTEGER NOT NULL,
            embedding BLOB NOT NULL
        );
        "#,
    )
    .map_err(db_err("Failed to create tables"))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Replace the stored index in a single transaction.
pub fn save_index(
    db_path: &Path,
    fingerprint: &IndexFingerprint,
    index: &MemoryIndex,
) -> AppResult<()> {
    let mut conn = init_index(db_path)?;
    let fingerprint_json = serde_json::to_string(fingerprint)?;

    let tx = conn
        .transaction()
        .map_err(db_err("Failed to begin transaction"))?;
    tx.execute("DELETE FROM entries", [])
        .map_err(db_err("Failed to clear entries"))?;
    tx.execute("DELETE FROM manifest", [])
        .map_err(db_err("Failed to clear manifest"))?;

    let mut count = 0usize;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO entries (position, start_byte, end_byte, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(db_err("Failed to prepare insert"))?;

        for (chunk, vector) in index.entries() {
            let span = chunk.span();
            stmt.execute(params![
                chunk.position() as i64,
                span.start as i64,
                span.end as i64,
                embedding_to_bytes(vector),
            ])
            .map_err(db_err("Failed to insert entry"))?;
            count += 1;
        }
    }

    tx.execute(
        "INSERT INTO manifest (id, fingerprint, built_at, chunk_count) VALUES (1, ?1, ?2, ?3)",
        params![fingerprint_json, Utc::now().to_rfc3339(), count as i64],
    )
    .map_err(db_err("Failed to write manifest"))?;

    tx.commit().map_err(db_err("Failed to commit index"))?;

    tracing::info!("Saved {} index entries to {:?}", count, db_path);
    Ok(())
}

struct Manifest {
    fingerprint: IndexFingerprint,
    built_at: DateTime<Utc>,
    chunk_count: usize,
}

fn read_manifest(conn: &Connection) -> AppResult<Option<Manifest>> {
    let row = conn
        .query_row(
            "SELECT fingerprint, built_at, chunk_count FROM manifest WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .optional()
        .map_err(db_err("Failed to read manifest"))?;

    let Some((fingerprint_json, built_at, chunk_count)) = row else {
        return Ok(None);
    };

    let fingerprint = serde_json::from_str(&fingerprint_json)?;
    let built_at = DateTime::parse_from_rfc3339(&built_at)
        .map_err(|e| AppError::Index(format!("Invalid build timestamp: {}", e)))?
        .with_timezone(&Utc);

    Ok(Some(Manifest {
        fingerprint,
        built_at,
        chunk_count: chunk_count.max(0) as usize,
    }))
}

/// Load a persisted index for `document`.
///
/// Returns `Ok(None)` when no file exists, the manifest is missing, or the
/// stored fingerprint differs from `expected`.
pub fn load_index(
    db_path: &Path,
    expected: &IndexFingerprint,
    document: &Arc<Document>,
) -> AppResult<Option<MemoryIndex>> {
    if !db_path.exists() {
        return Ok(None);
    }

    let conn = init_index(db_path)?;
    let Some(manifest) = read_manifest(&conn)? else {
        tracing::warn!("Index at {:?} has no manifest, rebuilding", db_path);
        return Ok(None);
    };

    if manifest.fingerprint != *expected {
        tracing::warn!(
            "Index at {:?} is stale (built {} from a different document or settings), rebuilding",
            db_path,
            manifest.built_at.to_rfc3339()
        );
        return Ok(None);
    }

    let mut stmt = conn
        .prepare("SELECT position, start_byte, end_byte, embedding FROM entries ORDER BY position")
        .map_err(db_err("Failed to prepare query"))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })
        .map_err(db_err("Failed to query entries"))?;

    let text = document.text();
    let mut entries = Vec::with_capacity(manifest.chunk_count);
    for (expected_position, row) in rows.enumerate() {
        let (position, start, end, blob) = row.map_err(db_err("Failed to read entry"))?;
        let (start, end) = (start as usize, end as usize);

        let valid = position as usize == expected_position
            && start < end
            && end <= text.len()
            && text.is_char_boundary(start)
            && text.is_char_boundary(end);
        if !valid {
            tracing::warn!("Index at {:?} has an invalid entry at {}, rebuilding", db_path, position);
            return Ok(None);
        }

        let chunk = Chunk::new(Arc::clone(document), expected_position, start..end);
        entries.push((chunk, bytes_to_embedding(&blob)?));
    }

    if entries.len() != manifest.chunk_count {
        tracing::warn!(
            "Index at {:?} holds {} entries, manifest says {}, rebuilding",
            db_path,
            entries.len(),
            manifest.chunk_count
        );
        return Ok(None);
    }

    let index = MemoryIndex::from_entries(entries, expected.dimensions)?;
    tracing::info!("Loaded {} index entries from {:?}", manifest.chunk_count, db_path);
    Ok(Some(index))
}

/// Read statistics from a persisted index without loading vectors.
pub fn read_stats(db_path: &Path) -> AppResult<Option<PersistedIndexStats>> {
    if !db_path.exists() {
        return Ok(None);
    }

    let conn = init_index(db_path)?;
    let Some(manifest) = read_manifest(&conn)? else {
        return Ok(None);
    };

    let file_size = std::fs::metadata(db_path)?.len();

    Ok(Some(PersistedIndexStats {
        path: db_path.to_path_buf(),
        fingerprint: manifest.fingerprint,
        built_at: manifest.built_at,
        chunks: manifest.chunk_count,
        file_size,
    }))
}

/// Convert embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

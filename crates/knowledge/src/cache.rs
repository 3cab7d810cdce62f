//! Process-wide cache of built pipelines.
//!
//! Keys combine the document content hash with every setting that affects
//! the build, so an edited document or changed configuration maps to a new
//! entry. Each key owns a `OnceCell`: concurrent first callers wait on a
//! single build, and a failed build leaves the cell empty for the next
//! caller to retry.

use crate::rag::RagPipeline;
use statute_core::AppResult;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::OnceCell;

type Cell = Arc<OnceCell<Arc<RagPipeline>>>;

#[derive(Default)]
pub struct PipelineCache {
    cells: Mutex<HashMap<String, Cell>>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process.
    pub fn global() -> &'static PipelineCache {
        static GLOBAL: OnceLock<PipelineCache> = OnceLock::new();
        GLOBAL.get_or_init(PipelineCache::new)
    }

    fn cell(&self, key: &str) -> Cell {
        let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(cells.entry(key.to_string()).or_default())
    }

    /// Return the pipeline for `key`, running `build` only if no pipeline
    /// is cached yet and no other caller is already building it.
    pub async fn get_or_build<F, Fut>(&self, key: &str, build: F) -> AppResult<Arc<RagPipeline>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<RagPipeline>>,
    {
        let cell = self.cell(key);
        if let Some(pipeline) = cell.get() {
            tracing::debug!("Pipeline cache hit for {}", short_key(key));
            return Ok(Arc::clone(pipeline));
        }

        let pipeline = cell
            .get_or_try_init(|| async {
                tracing::debug!("Pipeline cache miss for {}, building", short_key(key));
                build().await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(pipeline))
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
        cells.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.cells.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Number of keys with a finished build.
    pub fn len(&self) -> usize {
        self.cells
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn short_key(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}

//! Stats command handler.
//!
//! Reports on the persisted index for the configured document.

use clap::Args;
use statute_core::{config::AppConfig, AppResult};
use statute_knowledge::index_stats;
use std::process::ExitCode;

/// Show index statistics for the document
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing stats command");

        let stats = index_stats(config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(ExitCode::SUCCESS);
        }

        println!("Document: {}", stats.document.display());
        println!("Characters: {}", stats.document_chars);
        println!("Content hash: {}", stats.content_hash);

        match stats.persisted {
            Some(ref persisted) => {
                println!("Index: {}", persisted.path.display());
                println!("  Chunks: {}", persisted.chunks);
                println!(
                    "  Embeddings: {} / {} ({} dimensions)",
                    persisted.fingerprint.provider,
                    persisted.fingerprint.model,
                    persisted.fingerprint.dimensions
                );
                println!(
                    "  Chunking: size {}, overlap {}, {} splitter",
                    persisted.fingerprint.chunk_size,
                    persisted.fingerprint.chunk_overlap,
                    persisted.fingerprint.splitter
                );
                println!("  Built at: {}", persisted.built_at.to_rfc3339());
                println!("  Size: {:.1} KB", persisted.file_size as f64 / 1024.0);
                if stats.fresh {
                    println!("Status: fresh");
                } else {
                    println!("Status: stale (run `statute index` to rebuild)");
                }
            }
            None => println!("Index: not built (run `statute index`)"),
        }

        Ok(ExitCode::SUCCESS)
    }
}

//! Index command handler.

use clap::Args;
use statute_core::{config::AppConfig, AppResult};
use statute_knowledge::{build_index, IndexOrigin};
use std::process::ExitCode;

/// Build or refresh the persisted vector index
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Re-embed the document even if a fresh index exists
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing index command (rebuild: {})", self.rebuild);

        if !config.index.persist {
            tracing::warn!("Index persistence is disabled; the index will not be saved");
        }

        let stats = build_index(config, self.rebuild).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            let action = match stats.origin {
                IndexOrigin::Built => "Indexed",
                IndexOrigin::Loaded => "Index up to date for",
            };
            println!(
                "{} {}: {} chunks, {} dimensions in {:.2}s",
                action,
                stats.document,
                stats.chunks,
                stats.dimensions,
                stats.duration_ms as f64 / 1000.0
            );
            if let Some(ref path) = stats.index_path {
                println!("Index: {}", path.display());
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

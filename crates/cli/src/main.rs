//! Statute CLI
//!
//! Main entry point for the statute command-line tool.
//! Answers questions about a statutory text with retrieval-augmented
//! generation.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, IndexCommand, PromptsCommand, StatsCommand};
use statute_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use tracing::Instrument;
use std::process::ExitCode;

/// Statute - grounded answers from a statutory text
#[derive(Parser, Debug)]
#[command(name = "statute")]
#[command(about = "Grounded question answering over a statutory text", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "STATUTE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "STATUTE_CONFIG")]
    config: Option<PathBuf>,

    /// Statutory text to answer from (default: law.txt)
    #[arg(short, long, global = true, env = "STATUTE_DOCUMENT")]
    document: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (gemini, ollama)
    #[arg(short, long, global = true, env = "STATUTE_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "STATUTE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question about the document
    Ask(AskCommand),

    /// Build or refresh the persisted vector index
    Index(IndexCommand),

    /// Show index statistics for the document
    Stats(StatsCommand),

    /// List available prompt definitions
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("⚠ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AppResult<ExitCode> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.document,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Statute CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Document: {:?}", config.document_path());
    tracing::debug!(
        "Generation: {} ({}), embedding: {} ({})",
        config.generation.provider,
        config.generation.model,
        config.embedding.provider,
        config.embedding.model
    );

    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Index(_) => "index",
        Commands::Stats(_) => "stats",
        Commands::Prompts(_) => "prompts",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Index(cmd) => cmd.execute(&config).await,
            Commands::Stats(cmd) => cmd.execute(&config),
            Commands::Prompts(cmd) => cmd.execute(&config),
        }
    }
    .instrument(span)
    .await;

    if result.is_ok() {
        tracing::info!("Command completed");
    }

    result
}

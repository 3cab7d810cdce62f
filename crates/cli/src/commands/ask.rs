//! Ask command handler.
//!
//! Answers one question, or runs an interactive loop where every line is an
//! independent question. Query failures are printed as marked messages; in
//! the loop the next question is still accepted.

use clap::Args;
use statute_core::{config::AppConfig, AppError, AppResult};
use statute_knowledge::{open_pipeline, Answer, AnswerReport, QueryFailure, RagPipeline};
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Ask a question about the document
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask (omit with --interactive)
    pub question: Option<String>,

    /// Read questions from stdin, one per line, until EOF or `exit`
    #[arg(short, long, conflicts_with = "question")]
    pub interactive: bool,

    /// Number of chunks to retrieve as context
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Print the retrieved source passages after the answer
    #[arg(short, long)]
    pub show_sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let mut config = config.clone();
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }

        if !self.interactive && self.question.is_none() {
            return Err(AppError::InvalidInput(
                "No question provided (pass a question or use --interactive)".to_string(),
            ));
        }

        let pipeline = open_pipeline(&config).await?;

        if self.interactive {
            self.run_interactive(&pipeline).await?;
            return Ok(ExitCode::SUCCESS);
        }

        let question = self.question.as_deref().unwrap_or_default();
        let ok = self.answer(&pipeline, question).await?;
        Ok(if ok {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    async fn run_interactive(&self, pipeline: &RagPipeline) -> AppResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            if !self.json {
                print!("> ");
                std::io::stdout().flush()?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if matches!(question, "exit" | "quit") {
                break;
            }

            self.answer(pipeline, question).await?;
        }

        Ok(())
    }

    /// Answer one question; returns whether it succeeded.
    async fn answer(&self, pipeline: &RagPipeline, question: &str) -> AppResult<bool> {
        match pipeline.ask(question).await {
            Ok(answer) => {
                self.print_answer(&answer)?;
                Ok(true)
            }
            Err(failure) => {
                self.print_failure(&failure)?;
                Ok(false)
            }
        }
    }

    fn print_answer(&self, answer: &Answer) -> AppResult<()> {
        tracing::debug!(
            "Answer built from {} sources (max score: {:?})",
            answer.sources.len(),
            answer.max_score
        );

        if self.json {
            let report = AnswerReport::from(answer);
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("{}", answer.answer);

        if self.show_sources {
            println!();
            if answer.sources.is_empty() {
                println!("Sources: (no sources retrieved)");
            } else {
                println!("Sources:");
                for source in answer.source_refs() {
                    println!("- {} ({}, chunk {})", source.source, source.location, source.position);
                    println!("  {}", source.snippet.replace('\n', " "));
                }
            }
        }

        Ok(())
    }

    fn print_failure(&self, failure: &QueryFailure) -> AppResult<()> {
        if self.json {
            let output = serde_json::json!({ "error": failure });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", failure.user_message());
        }
        Ok(())
    }
}

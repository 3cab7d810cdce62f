//! Prompts command handler.

use clap::Args;
use statute_core::{config::AppConfig, AppResult};
use statute_prompt::{list_prompts, PromptOrigin};
use std::process::ExitCode;

/// List available prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        let prompts = list_prompts(&config.workspace)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&prompts)?);
            return Ok(ExitCode::SUCCESS);
        }

        for prompt in &prompts {
            let active = if prompt.id == config.generation.prompt { "*" } else { " " };
            let origin = match prompt.origin {
                PromptOrigin::BuiltIn => "built-in".to_string(),
                PromptOrigin::Workspace(ref path) => path.display().to_string(),
            };
            println!(
                "{} {:<20} {:<10} {} ({})",
                active, prompt.id, prompt.language, prompt.title, origin
            );
        }

        Ok(ExitCode::SUCCESS)
    }
}

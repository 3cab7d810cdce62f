//! Prompt system for statute.
//!
//! This crate provides structured prompt management with:
//! - Built-in grounded answering directives (Arabic and English)
//! - YAML-based workspace overrides in `.statute/prompts/`
//! - Handlebars template rendering of the retrieved context

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{builtin_prompt, builtin_prompts, DEFAULT_PROMPT_ID};
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptListing, PromptOrigin};

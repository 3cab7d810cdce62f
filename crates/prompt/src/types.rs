//! Prompt types for statute.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_separator() -> String {
    "\n\n".to_string()
}

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Language the answer must be written in
    pub language: String,

    /// Fixed phrase the model must use when the context lacks the answer
    #[serde(rename = "notAvailable")]
    pub not_available: String,

    /// System instruction template with Handlebars syntax.
    ///
    /// Available variables: `{{context}}`, `{{notAvailable}}`, `{{language}}`.
    pub template: String,

    /// Separator placed between retrieved chunks in `{{context}}`
    #[serde(rename = "contextSeparator", default = "default_separator")]
    pub context_separator: String,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System instruction: directive plus retrieved context
    pub system: String,

    /// User turn: the question
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Number of chunks rendered into the context
    #[serde(rename = "contextChunks")]
    pub context_chunks: usize,

    /// Characters of rendered context
    #[serde(rename = "contextChars")]
    pub context_chars: usize,
}

/// Where a prompt definition comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptOrigin {
    BuiltIn,
    Workspace(PathBuf),
}

/// Summary row for `list_prompts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptListing {
    pub id: String,
    pub title: String,
    pub language: String,
    pub origin: PromptOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: legal.answer.brief
title: Brief statutory answer
apiVersion: "1.0"
language: English
notAvailable: "Not in the text."
template: |
  Answer briefly from this context only:
  {{context}}
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "legal.answer.brief");
        assert_eq!(def.not_available, "Not in the text.");
        assert_eq!(def.context_separator, "\n\n");
    }

    #[test]
    fn test_origin_serialization() {
        let json = serde_json::to_string(&PromptOrigin::BuiltIn).unwrap();
        assert_eq!(json, "\"built_in\"");
    }
}

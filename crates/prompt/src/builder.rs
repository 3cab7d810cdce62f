//! Prompt builder for rendering templates and injecting retrieved context.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use handlebars::Handlebars;
use statute_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition, a question and the retrieved passages.
///
/// The passages are joined with the definition's separator in the order
/// given and rendered into the template's `{{context}}` slot. The question
/// becomes the user turn unchanged.
///
/// # Example
/// ```no_run
/// use statute_prompt::{build_prompt, builtin_prompt};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt("legal.answer.en").unwrap();
/// let built = build_prompt(&def, "What does Article 1 say?", &["Article 1: ..."])?;
/// println!("System: {}", built.system);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: &[&str],
) -> AppResult<BuiltPrompt> {
    tracing::debug!(prompt = %definition.id, chunks = context.len(), "Building prompt");

    let joined = context.join(&definition.context_separator);

    let mut variables = HashMap::new();
    variables.insert("context", joined.as_str());
    variables.insert("notAvailable", definition.not_available.as_str());
    variables.insert("language", definition.language.as_str());

    let system = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system,
        user: question.to_string(),
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            context_chunks: context.len(),
            context_chars: joined.chars().count(),
        },
    })
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<&str, &str>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Statutory text must reach the model verbatim
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::builtin_prompt;

    fn create_test_definition() -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            language: "English".to_string(),
            not_available: "N/A".to_string(),
            template: "Say {{notAvailable}} if unsure.\n{{context}}".to_string(),
            context_separator: "\n---\n".to_string(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("context", "Article 1");

        let result = render_template("Context: {{context}}", &vars).unwrap();
        assert_eq!(result, "Context: Article 1");
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("context", "a < b & \"c\"");

        let result = render_template("{{context}}", &vars).unwrap();
        assert_eq!(result, "a < b & \"c\"");
    }

    #[test]
    fn test_build_prompt_joins_context_in_order() {
        let def = create_test_definition();
        let built = build_prompt(&def, "Q?", &["first", "second"]).unwrap();

        assert_eq!(built.system, "Say N/A if unsure.\nfirst\n---\nsecond");
        assert_eq!(built.user, "Q?");
        assert_eq!(built.metadata.context_chunks, 2);
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_build_arabic_prompt() {
        let def = builtin_prompt("legal.answer.ar").unwrap();
        let built = build_prompt(&def, "ما هو سن الحضانة؟", &["المادة 20 ..."]).unwrap();

        assert!(built.system.contains("المادة 20 ..."));
        assert!(built.system.contains("المعلومات المطلوبة غير متوفرة في النص المقدم"));
        assert!(!built.system.contains("{{"));
    }

    #[test]
    fn test_render_template_invalid_syntax() {
        let vars = HashMap::new();
        let result = render_template("{{#if}}", &vars);
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}

//! Prompt loader for built-in and workspace YAML definitions.

use crate::defaults::{builtin_prompt, builtin_prompts};
use crate::types::{PromptDefinition, PromptListing, PromptOrigin};
use statute_core::config::STATE_DIR;
use statute_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(STATE_DIR).join("prompts")
}

fn workspace_prompt_file(workspace_path: &Path, prompt_id: &str) -> Option<PathBuf> {
    let dir = prompts_dir(workspace_path);
    ["yml", "yaml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", prompt_id, ext)))
        .find(|p| p.exists())
}

/// Load a prompt definition by ID.
///
/// A workspace file `.statute/prompts/<id>.yml` takes precedence over a
/// built-in definition with the same id.
///
/// # Example
/// ```no_run
/// use statute_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "legal.answer.ar")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(prompt_file) = workspace_prompt_file(workspace_path, prompt_id) {
        let definition = load_prompt_file(&prompt_file)?;
        if definition.id != prompt_id {
            return Err(AppError::Prompt(format!(
                "Prompt file {:?} declares id '{}', expected '{}'",
                prompt_file, definition.id, prompt_id
            )));
        }
        tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);
        return Ok(definition);
    }

    builtin_prompt(prompt_id).ok_or_else(|| {
        AppError::Prompt(format!(
            "Prompt '{}' not found in {:?} or built-ins",
            prompt_id,
            prompts_dir(workspace_path)
        ))
    })
}

fn load_prompt_file(prompt_file: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    let contents = std::fs::read_to_string(prompt_file).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", prompt_file, e))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", prompt_file, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// List built-in prompts and workspace prompt files.
///
/// Workspace files shadow built-ins with the same id. Invalid files are
/// skipped with a warning.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<PromptListing>> {
    let mut listings: Vec<PromptListing> = builtin_prompts()
        .into_iter()
        .map(|p| PromptListing {
            id: p.id,
            title: p.title,
            language: p.language,
            origin: PromptOrigin::BuiltIn,
        })
        .collect();

    let dir = prompts_dir(workspace_path);
    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yml") | Some("yaml")
            );
            if !path.is_file() || !is_yaml {
                continue;
            }

            match load_prompt_file(path) {
                Ok(def) => {
                    listings.retain(|l| l.id != def.id);
                    listings.push(PromptListing {
                        id: def.id,
                        title: def.title,
                        language: def.language,
                        origin: PromptOrigin::Workspace(path.to_path_buf()),
                    });
                }
                Err(e) => tracing::warn!("Skipping prompt file {:?}: {}", path, e),
            }
        }
    }

    listings.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(listings)
}

/// Validate a prompt definition.
pub fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if def.not_available.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt notAvailable phrase cannot be empty".to_string(),
        ));
    }

    if !def.template.contains("{{context}}") {
        return Err(AppError::Prompt(format!(
            "Prompt template '{}' must reference {{{{context}}}}",
            def.id
        )));
    }

    Ok(())
}

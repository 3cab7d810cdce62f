//! Configuration management for statute.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.statute/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Every recognised option lives in a typed section struct; unknown provider
//! names and out-of-range values are rejected by [`AppConfig::validate`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Embedding providers understood by the knowledge crate.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["gemini", "ollama", "mock"];

/// Generation providers understood by the llm crate.
pub const GENERATION_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".statute";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .statute/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Statutory text to answer from (relative paths resolve against the workspace)
    pub document: PathBuf,

    /// Explicit API key, takes precedence over provider `apiKeyEnv`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub index: IndexSettings,

    /// Provider connection settings keyed by provider name
    pub providers: HashMap<String, ProviderConfig>,
}

/// Strategy used to split the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitterKind {
    /// Boundary back-off: paragraph, line, period, space, character
    #[default]
    Recursive,
    /// Unicode-aware semantic levels from the `text-splitter` crate
    Semantic,
}

impl SplitterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Semantic => "semantic",
        }
    }
}

/// Chunking parameters, both measured in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub splitter: SplitterKind,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            splitter: SplitterKind::Recursive,
        }
    }
}

impl ChunkingConfig {
    /// Check `chunk_size >= 1` and `overlap < chunk_size`.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config(
                "chunkSize must be at least 1 character".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Retrieval policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Number of chunks handed to the generator
    pub top_k: usize,

    /// Drop retrieved chunks scoring below this cosine similarity
    pub min_score: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            min_score: None,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }
        if let Some(min) = self.min_score {
            if !min.is_finite() || !(-1.0..=1.0).contains(&min) {
                return Err(AppError::Config(format!(
                    "minScore must lie in [-1.0, 1.0], got {}",
                    min
                )));
            }
        }
        Ok(())
    }
}

/// Embedding provider selection and call policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
    /// Batches in flight while building the index
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "models/embedding-001".to_string(),
            dimensions: 768,
            batch_size: 100,
            concurrency: 4,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingSettings {
    pub fn validate(&self) -> AppResult<()> {
        if !EMBEDDING_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 || self.concurrency == 0 {
            return Err(AppError::Config(
                "embedding batchSize and concurrency must be positive".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "embedding timeoutSecs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generative model selection and call policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    /// Attempts per query step, 1 disables retry
    pub max_attempts: u32,
    /// Prompt definition id
    pub prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-1.5-pro".to_string(),
            temperature: 1.0,
            max_tokens: None,
            timeout_secs: 120,
            max_attempts: 1,
            prompt: "legal.answer.ar".to_string(),
        }
    }
}

impl GenerationSettings {
    pub fn validate(&self) -> AppResult<()> {
        if !GENERATION_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                self.provider,
                GENERATION_PROVIDERS.join(", ")
            )));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "temperature must lie in [0.0, 2.0], got {}",
                self.temperature
            )));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "generation timeoutSecs must be positive".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(AppError::Config(
                "maxAttempts must be at least 1".to_string(),
            ));
        }
        if self.prompt.trim().is_empty() {
            return Err(AppError::Config("prompt id cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Persisted index location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexSettings {
    /// Persist the built index and reuse it across runs
    pub persist: bool,

    /// Directory for index files (default `.statute/index`)
    pub dir: Option<PathBuf>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            persist: true,
            dir: None,
        }
    }
}

/// Provider-specific connection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        timeout: Option<u64>,
    },
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    document: Option<DocumentSection>,
    chunking: Option<ChunkingConfig>,
    retrieval: Option<RetrievalConfig>,
    embedding: Option<EmbeddingSettings>,
    generation: Option<GenerationSettings>,
    index: Option<IndexSettings>,
    providers: Option<HashMap<String, ProviderConfig>>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

fn default_providers() -> HashMap<String, ProviderConfig> {
    let mut providers = HashMap::new();
    providers.insert(
        "gemini".to_string(),
        ProviderConfig::Gemini {
            api_key_env: "GOOGLE_API_KEY".to_string(),
            endpoint: None,
        },
    );
    providers.insert(
        "ollama".to_string(),
        ProviderConfig::Ollama {
            endpoint: "http://localhost:11434".to_string(),
            timeout: None,
        },
    );
    providers
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            document: PathBuf::from("law.txt"),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
            index: IndexSettings::default(),
            providers: default_providers(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment variables.
    ///
    /// Environment variables:
    /// - `STATUTE_WORKSPACE`: Override workspace path
    /// - `STATUTE_CONFIG`: Path to config file
    /// - `STATUTE_DOCUMENT`: Statutory text to load
    /// - `STATUTE_PROVIDER`: Generation provider
    /// - `STATUTE_MODEL`: Generation model identifier
    /// - `STATUTE_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use statute_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Document: {:?}", config.document_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration with an explicit workspace and config file,
    /// falling back to the environment for either when `None`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        } else if let Ok(workspace) = std::env::var("STATUTE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        } else if let Ok(config_file) = std::env::var("STATUTE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(document) = std::env::var("STATUTE_DOCUMENT") {
            config.document = PathBuf::from(document);
        }

        if let Ok(provider) = std::env::var("STATUTE_PROVIDER") {
            config.generation.provider = provider;
        }

        if let Ok(model) = std::env::var("STATUTE_MODEL") {
            config.generation.model = model;
        }

        config.api_key = std::env::var("STATUTE_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Invalid config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        let mut result = self.clone();

        if let Some(path) = file.document.and_then(|d| d.path) {
            result.document = PathBuf::from(path);
        }
        if let Some(chunking) = file.chunking {
            result.chunking = chunking;
        }
        if let Some(retrieval) = file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(embedding) = file.embedding {
            result.embedding = embedding;
        }
        if let Some(generation) = file.generation {
            result.generation = generation;
        }
        if let Some(index) = file.index {
            result.index = index;
        }
        if let Some(providers) = file.providers {
            // File entries replace defaults of the same name only
            result.providers.extend(providers);
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the config file and environment.
    pub fn with_overrides(
        mut self,
        document: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(document) = document {
            self.document = document;
        }

        if let Some(provider) = provider {
            self.generation.provider = provider;
        }

        if let Some(model) = model {
            self.generation.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .statute directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .statute directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Absolute path of the statutory text.
    pub fn document_path(&self) -> PathBuf {
        if self.document.is_absolute() {
            self.document.clone()
        } else {
            self.workspace.join(&self.document)
        }
    }

    /// Directory holding persisted indexes.
    pub fn index_dir(&self) -> PathBuf {
        match self.index.dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => self.workspace.join(dir),
            None => self.state_dir().join("index"),
        }
    }

    /// Get a provider's connection configuration.
    pub fn provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }

    /// Endpoint override for a provider, if configured.
    pub fn provider_endpoint(&self, provider: &str) -> Option<&str> {
        match self.provider_config(provider)? {
            ProviderConfig::Gemini { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// Resolve the API key for a provider.
    ///
    /// `STATUTE_API_KEY` wins, then the provider's `apiKeyEnv` variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.provider_config(provider) {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            _ => None,
        }
    }

    /// Validate every section, including provider secrets.
    pub fn validate(&self) -> AppResult<()> {
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.embedding.validate()?;
        self.generation.validate()?;

        for provider in [&self.embedding.provider, &self.generation.provider] {
            if provider == "gemini" && self.resolve_api_key(provider).is_none() {
                let env_var = match self.provider_config(provider) {
                    Some(ProviderConfig::Gemini { api_key_env, .. }) => api_key_env.as_str(),
                    _ => "GOOGLE_API_KEY",
                };
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    env_var
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.embedding.provider = "mock".to_string();
        config.embedding.dimensions = 64;
        config.generation.provider = "ollama".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.generation.temperature, 1.0);
        assert_eq!(config.generation.model, "gemini-1.5-pro");
        assert!(config.index.persist);
        assert!(!config.verbose);
    }

    #[test]
    fn test_state_dir() {
        let config = AppConfig::default();
        assert!(config.state_dir().ends_with(".statute"));
        assert!(config.index_dir().ends_with(".statute/index"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some(PathBuf::from("other.txt")),
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.document, PathBuf::from("other.txt"));
        assert_eq!(overridden.generation.provider, "ollama");
        assert_eq!(overridden.generation.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = local_config();
        config.chunking.chunk_size = 1000;
        config.chunking.chunk_overlap = 1500;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.chunking.chunk_overlap = 1000;
        assert!(config.validate().is_err());

        config.chunking.chunk_overlap = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = local_config();
        config.retrieval.top_k = 0;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = local_config();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());

        let mut config = local_config();
        config.generation.provider = "mock".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_temperature_range() {
        let mut config = local_config();
        config.generation.temperature = 2.5;
        assert!(config.validate().is_err());
        config.generation.temperature = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_local_providers() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let mut config = local_config();
        config.generation.provider = "gemini".to_string();
        config.providers.insert(
            "gemini".to_string(),
            ProviderConfig::Gemini {
                api_key_env: "STATUTE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
                endpoint: None,
            },
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("STATUTE_TEST_KEY_THAT_IS_NEVER_SET"));

        config.api_key = Some("explicit".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
document:
  path: statutes/personal_status.txt
chunking:
  chunkSize: 800
  splitter: semantic
retrieval:
  topK: 4
  minScore: 0.2
generation:
  provider: ollama
  model: llama3.2
  temperature: 0.3
providers:
  ollama:
    endpoint: http://gpu-box:11434
    timeout: 60
logging:
  level: warn
  color: false
  json: true
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.document, PathBuf::from("statutes/personal_status.txt"));
        assert_eq!(merged.chunking.chunk_size, 800);
        // Missing keys inside a section fall back to defaults
        assert_eq!(merged.chunking.chunk_overlap, 200);
        assert_eq!(merged.chunking.splitter, SplitterKind::Semantic);
        assert_eq!(merged.retrieval.top_k, 4);
        assert_eq!(merged.retrieval.min_score, Some(0.2));
        assert_eq!(merged.generation.provider, "ollama");
        assert_eq!(merged.generation.prompt, "legal.answer.ar");
        assert_eq!(merged.provider_endpoint("ollama"), Some("http://gpu-box:11434"));
        // Untouched default provider survives
        assert!(merged.provider_config("gemini").is_some());
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
        assert!(merged.log_json);
    }

    #[test]
    fn test_load_with_workspace_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let state = temp.path().join(STATE_DIR);
        std::fs::create_dir_all(&state).unwrap();
        std::fs::write(
            state.join("config.yaml"),
            "retrieval:\n  topK: 3\nindex:\n  persist: false\n",
        )
        .unwrap();

        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.retrieval.top_k, 3);
        assert!(!config.index.persist);
        assert_eq!(config.document_path(), temp.path().join("law.txt"));
    }

    #[test]
    fn test_load_missing_explicit_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = AppConfig::load_with(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("missing.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

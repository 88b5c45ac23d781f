//! Configuration for examsage.
//!
//! TOML file at `~/.examsage/config.toml`, created with defaults on
//! first use. Every field has a default, so a partial file is fine.
//! Defaults mirror the reference deployment: OpenAI ada-002 embeddings
//! (1536 dims), gpt-4 completions capped at 10 tokens, temperature 0.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::errors::{EngineError, Result};
use crate::prompt::DEFAULT_LABELS;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Which backend serves both provider capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    OpenAi,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Override the backend base URL (e.g. a proxy, or a remote Ollama).
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_model")]
    pub model: String,
    /// Output length bound passed to the backend, not engine policy.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 0.0 keeps the answer deterministic.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// References retrieved per query when the caller does not say.
    #[serde(default = "default_k")]
    pub default_k: usize,
    /// Closed label set the model must answer from.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            labels: default_labels(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Concurrent embedding requests during ingestion.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request deadline for both provider backends.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retry budget for transient backend failures (adapter policy).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_completion_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    10
}

fn default_temperature() -> f32 {
    0.0
}

fn default_k() -> usize {
    3
}

fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
}

fn default_concurrency() -> usize {
    num_cpus::get()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist and parse. Without one,
    /// `~/.examsage/config.toml` is used and created with defaults on
    /// first run.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let contents = fs::read_to_string(path)?;
            return toml::from_str(&contents)
                .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)));
        }

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)?;
        toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("{}: {}", config_path.display(), e)))
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(e.to_string()))?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    /// `~/.examsage/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".examsage").join("config.toml"))
    }

    /// `~/.examsage/data` — where the CLI persists snapshots.
    pub fn default_data_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".examsage").join("data"))
    }

    /// The slice of this configuration the engine cares about.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            labels: self.retrieval.labels.clone(),
            ingest_concurrency: self.ingest.concurrency,
        }
    }
}

//! Configuration management for minirag
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! A missing config file is not an error: every section falls back to its defaults.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::provider::ProviderKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider selection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Ollama connection settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI-compatible API settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Ingestion configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Collection storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Chat configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend name ("ollama", "openai", "fastembed")
    #[serde(default = "default_backend")]
    pub backend: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

/// Ollama connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server URL
    #[serde(default = "default_ollama_url")]
    pub url: String,
}

/// OpenAI-compatible API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    /// Environment variable holding an alternative base URL
    #[serde(default = "default_openai_base_url_env")]
    pub base_url_env: String,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name; when unset the backend's default embedding model is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// L2-normalize chunk and query vectors so the dot product is cosine similarity
    #[serde(default = "default_embedding_normalize")]
    pub normalize: bool,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_max_chars")]
    pub max_chars: usize,

    /// Overlap characters between chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap_chars: usize,
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// File extensions ingested when a directory is given (case-insensitive, no dot)
    #[serde(default = "default_ingest_extensions")]
    pub extensions: Vec<String>,
}

/// Collection storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one artifact per collection
    #[serde(default = "default_collections_dir")]
    pub collections_dir: String,
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of chunks used as context
    #[serde(default = "default_query_k")]
    pub default_k: usize,

    /// Drop ranked chunks scoring below this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f32>,
}

/// Chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Chat model name
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// System prompt seeded into every conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Path the config was loaded from (or will be saved to)
    pub config_file: PathBuf,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_api_key_env(),
            base_url_env: default_openai_base_url_env(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: None,
            normalize: default_embedding_normalize(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: default_chunk_max_chars(),
            overlap_chars: default_chunk_overlap(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: default_ingest_extensions(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            collections_dir: default_collections_dir(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_k: default_query_k(),
            min_score: None,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl Config {
    /// Get the default base directory for minirag (~/.minirag)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minirag")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration if the file exists, otherwise fall back to defaults
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self> {
        let path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_config_path);

        if path.exists() {
            return Self::load(&path);
        }

        if config_path.is_some() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        debug!("No config file found at {:?}, using defaults", path);
        let config = Config {
            paths: PathsConfig { config_file: path },
            ..Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// The configured backend
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        self.provider.backend.parse()
    }

    /// Embedding model name, falling back to the backend's default
    pub fn embedding_model(&self) -> Result<String> {
        match &self.embedding.model {
            Some(model) => Ok(model.clone()),
            None => Ok(self.provider_kind()?.default_embedding_model().to_string()),
        }
    }

    /// Root directory for collection artifacts
    pub fn collections_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.collections_dir)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.provider_kind()?;

        if self.provider.timeout_secs == 0 {
            return Err(Error::Config(
                "provider.timeout_secs must be positive".to_string(),
            ));
        }

        if self.chunk.max_chars == 0 {
            return Err(Error::Config("chunk.max_chars must be > 0".to_string()));
        }

        if self.chunk.overlap_chars >= self.chunk.max_chars {
            return Err(Error::Config(
                "chunk.overlap_chars must be < chunk.max_chars".to_string(),
            ));
        }

        if self.storage.collections_dir.trim().is_empty() {
            return Err(Error::Config(
                "storage.collections_dir must not be empty".to_string(),
            ));
        }

        if self.embedding.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(Error::Config(
                "embedding.model must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.backend, "ollama");
        assert_eq!(config.chunk.max_chars, 1000);
        assert_eq!(config.chunk.overlap_chars, 20);
        assert_eq!(config.query.default_k, 5);
        assert_eq!(config.storage.collections_dir, "collections");
        assert_eq!(config.ingest.extensions, vec!["txt".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config = Config::default();
        config.paths.config_file = path.clone();
        config.storage.collections_dir = "my-collections".to_string();
        config.embedding.model = Some("nomic-embed-text".to_string());

        config.save().unwrap();
        assert!(path.exists());

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.storage.collections_dir, "my-collections");
        assert_eq!(loaded.embedding_model().unwrap(), "nomic-embed-text");
        assert_eq!(loaded.paths.config_file, path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[chunk]\nmax_chars = 500\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.chunk.max_chars, 500);
        assert_eq!(config.chunk.overlap_chars, 20);
        assert_eq!(config.chat.model, "llama3.2:1b");
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            Config::load_or_default(Some(&missing)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Invalid: overlap >= max
        config.chunk.overlap_chars = config.chunk.max_chars;
        assert!(config.validate().is_err());

        config.chunk.overlap_chars = 100;
        assert!(config.validate().is_ok());

        config.chunk.max_chars = 0;
        config.chunk.overlap_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_backend_fails_validation() {
        let mut config = Config::default();
        config.provider.backend = "invalid_backend".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown backend"));
    }

    #[test]
    fn test_embedding_model_defaults_per_backend() {
        let mut config = Config::default();
        assert_eq!(config.embedding_model().unwrap(), "all-minilm");

        config.provider.backend = "openai".to_string();
        assert_eq!(config.embedding_model().unwrap(), "text-embedding-3-small");
    }
}

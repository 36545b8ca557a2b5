//! Model providers: embeddings, streamed chat, model availability
//!
//! This module provides an abstraction over model servers with:
//! - A trait every backend implements
//! - Ollama and OpenAI-compatible HTTP backends
//! - An in-process FastEmbed backend (behind the `local-embed` feature)
//! - Optional L2 normalization of embeddings

#[cfg(feature = "local-embed")]
mod fastembed_impl;
mod http;
mod lines;
#[cfg(test)]
pub(crate) mod mock;
mod ollama;
mod openai;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;
pub use ollama::*;
pub use openai::*;

use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Streamed reply fragments, in arrival order
pub type ChatStream = BoxStream<'static, Result<String>>;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry in a chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for model backends
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend name, as written in configuration
    fn name(&self) -> &'static str;

    /// Embed one text with the named model
    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>>;

    /// Start a streamed chat completion over the full history
    async fn chat(&self, model: &str, messages: &[Message]) -> Result<ChatStream>;

    /// Whether the model is available to this backend
    async fn model_exists(&self, model: &str) -> Result<bool>;

    /// Make the model available (download it)
    async fn pull_model(&self, model: &str) -> Result<()>;
}

/// Known backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    OpenAi,
    FastEmbed,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Ollama,
        ProviderKind::OpenAi,
        ProviderKind::FastEmbed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
            ProviderKind::FastEmbed => "fastembed",
        }
    }

    /// Embedding model used when the configuration names none
    pub fn default_embedding_model(self) -> &'static str {
        match self {
            ProviderKind::Ollama => "all-minilm",
            ProviderKind::OpenAi => "text-embedding-3-small",
            ProviderKind::FastEmbed => "sentence-transformers/all-MiniLM-L6-v2",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim().to_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                let available: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.as_str()).collect();
                Error::Config(format!(
                    "Unknown backend: {}; available backends: {}",
                    value,
                    available.join(", ")
                ))
            })
    }
}

/// Create the provider named by the configuration
pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    let timeout = Duration::from_secs(config.provider.timeout_secs);

    match config.provider_kind()? {
        ProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(&config.ollama.url, timeout)?)),
        ProviderKind::OpenAi => Ok(Box::new(OpenAiProvider::from_config(
            &config.openai,
            timeout,
        )?)),
        #[cfg(feature = "local-embed")]
        ProviderKind::FastEmbed => Ok(Box::new(FastEmbedProvider::new())),
        #[cfg(not(feature = "local-embed"))]
        ProviderKind::FastEmbed => Err(Error::Config(
            "The fastembed backend requires building with the 'local-embed' feature".to_string(),
        )),
    }
}

/// Make sure a model is available, pulling it when the backend can.
/// Backends that cannot pull only get a warning; any other pull failure is returned.
pub async fn ensure_model(provider: &dyn Provider, model: &str) -> Result<()> {
    if provider.model_exists(model).await? {
        return Ok(());
    }

    info!("Model {} not found locally, pulling it", model);
    match provider.pull_model(model).await {
        Ok(()) => {
            info!("Model {} is ready", model);
            Ok(())
        }
        Err(e @ Error::PullUnsupported(_)) => {
            warn!("{}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Scale a vector to unit length; the zero vector is returned unchanged
pub fn normalize_embedding(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

/// The embedding step shared by ingestion and search: one provider, one model
pub struct Embedder<'a> {
    provider: &'a dyn Provider,
    model: String,
    normalize: bool,
}

impl<'a> Embedder<'a> {
    pub fn new(provider: &'a dyn Provider, model: impl Into<String>, normalize: bool) -> Self {
        Self {
            provider,
            model: model.into(),
            normalize,
        }
    }

    /// Build from configuration (model falls back to the backend default)
    pub fn from_config(provider: &'a dyn Provider, config: &Config) -> Result<Self> {
        Ok(Self::new(
            provider,
            config.embedding_model()?,
            config.embedding.normalize,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.provider.embed(text, &self.model).await?;
        if self.normalize {
            Ok(normalize_embedding(&vector))
        } else {
            Ok(vector)
        }
    }
}

//! FastEmbed backend for in-process local embeddings

use super::{ChatStream, Message, Provider};
use crate::error::{Error, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Embeds locally with ONNX models, loading each model on first use
pub struct FastEmbedProvider {
    models: Mutex<HashMap<String, Arc<Mutex<TextEmbedding>>>>,
}

/// Map model name to fastembed model enum
fn model_for_name(name: &str) -> Option<EmbeddingModel> {
    match name {
        "BAAI/bge-small-en-v1.5" => Some(EmbeddingModel::BGESmallENV15),
        "BAAI/bge-base-en-v1.5" => Some(EmbeddingModel::BGEBaseENV15),
        "BAAI/bge-large-en-v1.5" => Some(EmbeddingModel::BGELargeENV15),
        "sentence-transformers/all-MiniLM-L6-v2" | "all-minilm" => {
            Some(EmbeddingModel::AllMiniLML6V2)
        }
        _ => None,
    }
}

impl FastEmbedProvider {
    pub fn new() -> Self {
        Self {
            models: Mutex::new(HashMap::new()),
        }
    }

    /// Load (downloading if needed) and cache a model
    async fn load(&self, name: &str) -> Result<Arc<Mutex<TextEmbedding>>> {
        let mut models = self.models.lock().await;
        if let Some(model) = models.get(name) {
            return Ok(model.clone());
        }

        let model_enum =
            model_for_name(name).ok_or_else(|| Error::ModelNotFound(name.to_string()))?;
        info!("Initializing FastEmbed with model: {}", name);

        let options = InitOptions::new(model_enum).with_show_download_progress(true);
        let model = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
            .await?
            .map_err(|e| Error::Provider(format!("Failed to initialize model: {}", e)))?;

        info!("FastEmbed model loaded successfully");
        let model = Arc::new(Mutex::new(model));
        models.insert(name.to_string(), model.clone());
        Ok(model)
    }
}

impl Default for FastEmbedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for FastEmbedProvider {
    fn name(&self) -> &'static str {
        "fastembed"
    }

    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let model = self.load(model).await?;
        let texts = vec![text.to_string()];
        debug!("Embedding {} chars locally", text.len());

        // FastEmbed is synchronous, so we wrap in blocking task
        let embeddings = tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            model.embed(texts, None)
        })
        .await?
        .map_err(|e| Error::Provider(format!("Embedding failed: {}", e)))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("FastEmbed returned no embedding".to_string()))
    }

    async fn chat(&self, _model: &str, _messages: &[Message]) -> Result<ChatStream> {
        Err(Error::Provider(
            "The fastembed backend only provides embeddings; use ollama or openai for chat"
                .to_string(),
        ))
    }

    async fn model_exists(&self, model: &str) -> Result<bool> {
        Ok(model_for_name(model).is_some())
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        self.load(model).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_models() {
        let provider = FastEmbedProvider::new();
        assert!(provider.model_exists("BAAI/bge-small-en-v1.5").await.unwrap());
        assert!(provider.model_exists("all-minilm").await.unwrap());
        assert!(!provider.model_exists("nomic-embed-text").await.unwrap());
    }

    #[tokio::test]
    async fn test_chat_unsupported() {
        let provider = FastEmbedProvider::new();
        assert!(provider.chat("any", &[]).await.is_err());
    }

    // Integration test - requires model download
    #[tokio::test]
    #[ignore] // Run manually with: cargo test --features local-embed -- --ignored
    async fn test_fastembed_integration() {
        let provider = FastEmbedProvider::new();
        let embedding = provider
            .embed("Hello world", "BAAI/bge-small-en-v1.5")
            .await
            .unwrap();
        assert_eq!(embedding.len(), 384);
    }
}

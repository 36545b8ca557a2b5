//! In-memory provider for tests

use super::{ChatStream, Message, Provider};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub(crate) struct MockProvider {
    embeddings: HashMap<String, Vec<f32>>,
    default_embedding: Vec<f32>,
    failing_text: Option<String>,
    reply: Vec<String>,
    models: HashSet<String>,
    pullable: bool,
    pull_unsupported: bool,
    pub embedded: Mutex<Vec<String>>,
    pub chat_requests: Mutex<Vec<Vec<Message>>>,
    pub pulled: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            embeddings: HashMap::new(),
            default_embedding: vec![0.0, 0.0, 0.0],
            failing_text: None,
            reply: vec!["ok".to_string()],
            models: HashSet::new(),
            pullable: true,
            pull_unsupported: false,
            embedded: Mutex::new(Vec::new()),
            chat_requests: Mutex::new(Vec::new()),
            pulled: Mutex::new(Vec::new()),
        }
    }

    pub fn with_embedding(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.embeddings.insert(text.to_string(), vector);
        self
    }

    pub fn with_default_embedding(mut self, vector: Vec<f32>) -> Self {
        self.default_embedding = vector;
        self
    }

    /// Embedding any text containing `needle` fails
    pub fn failing_on(mut self, needle: &str) -> Self {
        self.failing_text = Some(needle.to_string());
        self
    }

    pub fn with_reply(mut self, fragments: &[&str]) -> Self {
        self.reply = fragments.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.models.insert(model.to_string());
        self
    }

    pub fn unpullable(mut self) -> Self {
        self.pullable = false;
        self
    }

    pub fn without_pull_support(mut self) -> Self {
        self.pull_unsupported = true;
        self
    }

    pub fn embed_count(&self) -> usize {
        self.embedded.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn embed(&self, text: &str, _model: &str) -> Result<Vec<f32>> {
        self.embedded.lock().unwrap().push(text.to_string());

        if let Some(needle) = &self.failing_text {
            if text.contains(needle.as_str()) {
                return Err(Error::Provider(format!("cannot embed '{}'", text)));
            }
        }

        Ok(self
            .embeddings
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default_embedding.clone()))
    }

    async fn chat(&self, _model: &str, messages: &[Message]) -> Result<ChatStream> {
        self.chat_requests.lock().unwrap().push(messages.to_vec());
        let fragments: Vec<Result<String>> = self.reply.iter().cloned().map(Ok).collect();
        Ok(stream::iter(fragments).boxed())
    }

    async fn model_exists(&self, model: &str) -> Result<bool> {
        Ok(self.models.contains(model) || self.pulled.lock().unwrap().iter().any(|m| m == model))
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        if self.pull_unsupported {
            return Err(Error::PullUnsupported(self.name().to_string()));
        }
        if !self.pullable {
            return Err(Error::ModelNotFound(model.to_string()));
        }
        self.pulled.lock().unwrap().push(model.to_string());
        Ok(())
    }
}

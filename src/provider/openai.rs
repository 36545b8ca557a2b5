//! OpenAI-compatible backend

use super::http::{error_for_status, HttpClient};
use super::lines::sse_events;
use super::{ChatStream, Message, Provider};
use crate::config::{default_openai_base_url, OpenAiConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::future;
use futures::stream::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for the OpenAI API or any server speaking the same protocol
pub struct OpenAiProvider {
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config(
                "An API key is required for the OpenAI backend".to_string(),
            ));
        }

        Ok(Self {
            http: HttpClient::new(base_url, timeout)?.with_bearer_auth(api_key),
        })
    }

    /// Read the API key and base URL from the environment variables the config names
    pub fn from_config(config: &OpenAiConfig, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "{} environment variable is required for the OpenAI backend",
                    config.api_key_env
                ))
            })?;

        let base_url = std::env::var(&config.base_url_env)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(default_openai_base_url);
        debug!("Using OpenAI-compatible API at {}", base_url);

        Self::new(&api_key, &base_url, timeout)
    }
}

fn parse_chat_event(data: Result<String>) -> Option<Result<String>> {
    let data = match data {
        Ok(data) => data,
        Err(e) => return Some(Err(e)),
    };

    match serde_json::from_str::<ChatChunk>(&data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(Ok),
        Err(e) => Some(Err(Error::Json(e))),
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let request = EmbeddingsRequest { model, input: text };
        let response = self.http.post_json("embeddings", &request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ModelNotFound(model.to_string()));
        }

        let parsed: EmbeddingsResponse = error_for_status(response).await?.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Provider("Embeddings response contained no data".to_string()))
    }

    async fn chat(&self, model: &str, messages: &[Message]) -> Result<ChatStream> {
        let request = ChatRequest {
            model,
            messages,
            stream: true,
        };
        let response = self
            .http
            .post_json_streaming("chat/completions", &request)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ModelNotFound(model.to_string()));
        }
        let response = error_for_status(response).await?;

        Ok(sse_events(response)
            .filter_map(|data| future::ready(parse_chat_event(data)))
            .boxed())
    }

    async fn model_exists(&self, model: &str) -> Result<bool> {
        let response = self.http.get(&format!("models/{}", model)).await?;
        if response.status().is_client_error() {
            return Ok(false);
        }
        error_for_status(response).await?;
        Ok(true)
    }

    async fn pull_model(&self, _model: &str) -> Result<()> {
        Err(Error::PullUnsupported(self.name().to_string()))
    }
}

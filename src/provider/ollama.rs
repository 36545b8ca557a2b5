//! Ollama backend

use super::http::{error_for_status, HttpClient};
use super::lines::body_lines;
use super::{ChatStream, Message, Provider};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::future;
use futures::stream::StreamExt;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Client for a local or remote Ollama server
pub struct OllamaProvider {
    http: HttpClient,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
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
    message: Option<ChatDelta>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

/// One NDJSON status line of a streamed pull
#[derive(Debug, Deserialize)]
struct PullProgress {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaProvider {
    /// `url` may omit the scheme, as `OLLAMA_HOST` often does
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        };
        debug!("Using Ollama at {}", url);

        Ok(Self {
            http: HttpClient::new(&url, timeout)?,
        })
    }
}

/// A tag matches with or without the implicit `:latest`
fn tag_matches(tag: &str, model: &str) -> bool {
    tag == model || tag.strip_suffix(":latest") == Some(model)
}

fn parse_chat_line(line: Result<String>) -> Option<Result<String>> {
    let line = match line {
        Ok(line) => line,
        Err(e) => return Some(Err(e)),
    };
    if line.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<ChatChunk>(&line) {
        Ok(ChatChunk {
            error: Some(error), ..
        }) => Some(Err(Error::Provider(error))),
        Ok(chunk) => chunk
            .message
            .map(|m| m.content)
            .filter(|content| !content.is_empty())
            .map(Ok),
        Err(e) => Some(Err(Error::Json(e))),
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn embed(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let request = EmbeddingsRequest {
            model,
            prompt: text,
        };
        let response = self.http.post_json("api/embeddings", &request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ModelNotFound(model.to_string()));
        }

        let parsed: EmbeddingsResponse = error_for_status(response).await?.json().await?;
        Ok(parsed.embedding)
    }

    async fn chat(&self, model: &str, messages: &[Message]) -> Result<ChatStream> {
        let request = ChatRequest {
            model,
            messages,
            stream: true,
        };
        let response = self.http.post_json_streaming("api/chat", &request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ModelNotFound(model.to_string()));
        }
        let response = error_for_status(response).await?;

        Ok(body_lines(response)
            .filter_map(|line| future::ready(parse_chat_line(line)))
            .boxed())
    }

    async fn model_exists(&self, model: &str) -> Result<bool> {
        let response = error_for_status(self.http.get("api/tags").await?).await?;
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.iter().any(|tag| tag_matches(&tag.name, model)))
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        info!("Pulling model {} (this may take a while)", model);

        let request = PullRequest {
            name: model,
            stream: true,
        };
        let response = self.http.post_json_streaming("api/pull", &request).await?;
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ModelNotFound(format!("{}: {}", model, body.trim())));
        }

        let mut lines = body_lines(response);
        while let Some(line) = lines.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let progress: PullProgress = serde_json::from_str(&line)?;
            if let Some(error) = progress.error {
                return Err(Error::ModelNotFound(format!("{}: {}", model, error)));
            }
            if let Some(status) = progress.status {
                debug!(model, status = %status, "Pull progress");
            }
        }

        info!("Pulled model {}", model);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OllamaProvider {
        OllamaProvider::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_scheme_is_optional() {
        assert!(OllamaProvider::new("localhost:11434", Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_tag_matches() {
        assert!(tag_matches("all-minilm:latest", "all-minilm"));
        assert!(tag_matches("llama3.2:1b", "llama3.2:1b"));
        assert!(!tag_matches("llama3.2:3b", "llama3.2:1b"));
        assert!(!tag_matches("all-minilm:latest", "all"));
    }

    #[tokio::test]
    async fn test_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": "all-minilm",
                "prompt": "hello"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "embedding": [0.1, 0.2, 0.3] })),
            )
            .mount(&server)
            .await;

        let embedding = provider(&server).embed("hello", "all-minilm").await.unwrap();
        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_unknown_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "error": "model 'nope' not found" })),
            )
            .mount(&server)
            .await;

        let err = provider(&server).embed("hello", "nope").await.unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(m) if m == "nope"));
    }

    #[tokio::test]
    async fn test_chat_streams_fragments() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({ "stream": true })))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let messages = vec![Message::user("hi")];
        let stream = provider(&server).chat("llama3.2:1b", &messages).await.unwrap();
        let fragments: Vec<String> = stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .map(|f| f.unwrap())
            .collect();
        assert_eq!(fragments, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn test_chat_stream_error_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("{\"error\":\"out of memory\"}\n"),
            )
            .mount(&server)
            .await;

        let stream = provider(&server)
            .chat("llama3.2:1b", &[Message::user("hi")])
            .await
            .unwrap();
        let results: Vec<Result<String>> = stream.collect().await;
        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0], Err(Error::Provider(m)) if m == "out of memory"));
    }

    #[tokio::test]
    async fn test_model_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{ "name": "all-minilm:latest" }, { "name": "llama3.2:1b" }]
            })))
            .mount(&server)
            .await;

        let provider = provider(&server);
        assert!(provider.model_exists("all-minilm").await.unwrap());
        assert!(provider.model_exists("llama3.2:1b").await.unwrap());
        assert!(!provider.model_exists("mistral").await.unwrap());
    }

    #[tokio::test]
    async fn test_pull_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .and(body_partial_json(serde_json::json!({
                "name": "all-minilm",
                "stream": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
                "{\"status\":\"pulling manifest\"}\n",
                "{\"status\":\"downloading\",\"total\":100,\"completed\":50}\n",
                "{\"status\":\"success\"}\n",
            )))
            .expect(1)
            .mount(&server)
            .await;

        provider(&server).pull_model("all-minilm").await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_pull_is_not_cut_off() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"status\":\"success\"}\n")
                    .set_delay(Duration::from_millis(1500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(&server.uri(), Duration::from_millis(500)).unwrap();
        provider.pull_model("llama3.2:1b").await.unwrap();
    }

    #[tokio::test]
    async fn test_pull_error_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
                "{\"status\":\"pulling manifest\"}\n",
                "{\"error\":\"pull model manifest: file does not exist\"}\n",
            )))
            .mount(&server)
            .await;

        let err = provider(&server).pull_model("no-such-model").await.unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(m) if m.starts_with("no-such-model: ")));
    }

    #[tokio::test]
    async fn test_slow_chat_is_not_cut_off() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"message\":{\"content\":\"late\"},\"done\":true}\n")
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(&server.uri(), Duration::from_millis(500)).unwrap();
        let stream = provider
            .chat("llama3.2:1b", &[Message::user("hi")])
            .await
            .unwrap();
        let fragments: Vec<Result<String>> = stream.collect().await;
        assert!(matches!(fragments.as_slice(), [Ok(text)] if text == "late"));
    }

    #[tokio::test]
    async fn test_pull_unknown_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(ResponseTemplate::new(500).set_body_json(
                serde_json::json!({ "error": "pull model manifest: file does not exist" }),
            ))
            .mount(&server)
            .await;

        let err = provider(&server).pull_model("no-such-model").await.unwrap_err();
        assert!(matches!(err, Error::ModelNotFound(m) if m.contains("file does not exist")));
    }
}

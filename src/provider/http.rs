//! Shared HTTP plumbing for provider backends

use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A base URL plus a configured client, retrying transient failures.
///
/// Plain requests are bounded by `request_timeout` end to end. Streamed
/// requests (chat replies, model pulls) only bound the connection, since
/// their bodies can legitimately run for minutes.
pub(crate) struct HttpClient {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
    request_timeout: Duration,
    retries: usize,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        // A trailing slash makes `join` append instead of replacing the last segment
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        let client = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            bearer_token: None,
            request_timeout: timeout,
            retries: 2,
        })
    }

    pub fn with_bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("Invalid provider URL: {}", e)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = self.endpoint(path)?;
        let request = self.client.get(url).timeout(self.request_timeout);
        self.send_with_retry(self.authorize(request)).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.endpoint(path)?;
        let request = self.client.post(url).json(body).timeout(self.request_timeout);
        self.send_with_retry(self.authorize(request)).await
    }

    /// POST whose response is read as a stream; no overall deadline applies
    pub async fn post_json_streaming<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response> {
        let url = self.endpoint(path)?;
        self.send_with_retry(self.authorize(self.client.post(url).json(body)))
            .await
    }

    /// Send a request, retrying connection failures and 5xx responses.
    /// The last response is returned whatever its status, for the caller to inspect.
    async fn send_with_retry(&self, request: RequestBuilder) -> Result<Response> {
        let mut attempt = 0;
        loop {
            let req = request
                .try_clone()
                .ok_or_else(|| Error::Provider("Failed to clone provider request".to_string()))?;

            match req.send().await {
                Ok(response) if response.status().is_server_error() && attempt < self.retries => {
                    debug!(attempt, status = %response.status(), "Provider returned a server error, retrying");
                }
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retries => {
                    debug!(attempt, "Provider request failed, retrying: {}", e);
                }
                Err(e) => return Err(Error::Http(e)),
            }

            attempt += 1;
            tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
        }
    }
}

/// Turn a non-success response into a provider error carrying the response body
pub(crate) async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Provider(format!(
        "{} returned {}: {}",
        url,
        status,
        body.trim()
    )))
}

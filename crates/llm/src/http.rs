//! Shared HTTP plumbing for the managed services.
//!
//! Every call is a single JSON POST. Transport failures and non-2xx answers
//! both become `AppError::Service` carrying the original message.

use kbrag_core::{AppError, AppResult, RagConfig};
use serde::Serialize;
use std::time::Duration;

/// Build the HTTP client used for all service calls.
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Service(format!("Failed to build HTTP client: {}", e)))
}

/// Connection settings shared by every service client.
#[derive(Debug, Clone)]
pub struct ServiceConnection {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub client: reqwest::Client,
}

impl ServiceConnection {
    /// Create a connection to `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
            client: build_http_client(timeout)?,
        })
    }

    /// Connection settings for `base_url` taken from the loaded config.
    pub fn from_config(base_url: String, config: &RagConfig) -> AppResult<Self> {
        Self::new(base_url, config.bearer_token(), config.request_timeout())
    }

    /// Build an URL under the base, percent-encoding each path segment.
    pub fn url(&self, segments: &[&str]) -> AppResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("Invalid base URL {}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("Base URL cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// POST `body` as JSON and return the decoded JSON answer.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: reqwest::Url,
        body: &B,
    ) -> AppResult<serde_json::Value> {
        tracing::info!("POST {}", url.path());
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!("Request body: {}", serde_json::to_string(body)?);
        }

        let mut request = self.client.post(url.clone()).json(body);
        if let Some(ref token) = self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Service(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        tracing::info!("{} answered {}", url.path(), status);
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Service(format!(
                "{} returned {}: {}",
                url.path(),
                status,
                error_text
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Service(format!("Failed to decode response from {}: {}", url, e)))?;
        tracing::debug!("Response body: {}", value);

        Ok(value)
    }
}

/// One-shot HTTP responder for tests.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve a single request with `status` and JSON `body`.
    ///
    /// Returns the base URL and a handle resolving to the raw request text.
    pub async fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            request
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);

                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).to_string()
    }

    /// Body part of a captured raw request.
    pub fn request_body(raw: &str) -> serde_json::Value {
        let body = raw.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("");
        serde_json::from_str(body).unwrap()
    }
}

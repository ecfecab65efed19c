//! Self-hosted inference endpoint provider.
//!
//! Posts `{inputs, parameters}` to `{base}/endpoints/{name}/invocations`.
//! The prompt must already be formatted for the hosted model; see
//! `kbrag_prompt::chat` for the turn structure.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::http::ServiceConnection;
use crate::response::resolve_generated_text;
use kbrag_core::{AppResult, RagConfig};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct EndpointRequest {
    inputs: String,
    parameters: EndpointParameters,
}

#[derive(Debug, Serialize)]
struct EndpointParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Client for one self-hosted endpoint.
pub struct EndpointClient {
    connection: ServiceConnection,
    endpoint_name: String,
}

impl EndpointClient {
    pub fn new(connection: ServiceConnection, endpoint_name: impl Into<String>) -> Self {
        Self {
            connection,
            endpoint_name: endpoint_name.into(),
        }
    }

    /// Client for the endpoint named in the config.
    pub fn from_config(config: &RagConfig) -> AppResult<Self> {
        let name = config.require_endpoint_name()?.to_string();
        Ok(Self::new(
            ServiceConnection::from_config(config.sagemaker_runtime_url(), config)?,
            name,
        ))
    }

    pub fn endpoint_name(&self) -> &str {
        &self.endpoint_name
    }

    fn to_endpoint_request(&self, request: &LlmRequest) -> EndpointRequest {
        EndpointRequest {
            inputs: request.prompt.clone(),
            parameters: EndpointParameters {
                max_new_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
            },
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for EndpointClient {
    fn provider_name(&self) -> &str {
        "endpoint"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Invoking endpoint {}", self.endpoint_name);
        tracing::debug!("Prompt: {}", request.prompt);

        let url = self
            .connection
            .url(&["endpoints", &self.endpoint_name, "invocations"])?;
        let body = self.to_endpoint_request(request);
        let value = self.connection.post_json(url, &body).await?;

        let content = resolve_generated_text(value)?;
        tracing::info!("Endpoint {} returned {} chars", self.endpoint_name, content.len());

        Ok(LlmResponse {
            content,
            model: self.endpoint_name.clone(),
            usage: LlmUsage::default(),
            latency_ms: None,
        })
    }
}

//! Managed model runtime provider (Converse API).
//!
//! Used for judging answers and decomposing queries. One POST per request to
//! `{base}/model/{modelId}/converse`.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::http::ServiceConnection;
use kbrag_core::{AppError, AppResult, RagConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ConverseRequest {
    messages: Vec<ConverseMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<ContentBlock>,
    #[serde(rename = "inferenceConfig", skip_serializing_if = "InferenceConfig::is_empty")]
    inference_config: InferenceConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConverseMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct InferenceConfig {
    #[serde(rename = "maxTokens", skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

impl InferenceConfig {
    fn is_empty(&self) -> bool {
        self.max_tokens.is_none() && self.temperature.is_none() && self.top_p.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct ConverseResponse {
    output: ConverseOutput,
    #[serde(default)]
    usage: Option<ConverseUsage>,
    #[serde(default)]
    metrics: Option<ConverseMetrics>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: ConverseMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseMetrics {
    latency_ms: u64,
}

/// Client for the managed model runtime.
pub struct BedrockClient {
    connection: ServiceConnection,
}

impl BedrockClient {
    pub fn new(connection: ServiceConnection) -> Self {
        Self { connection }
    }

    /// Client pointed at the configured model runtime.
    pub fn from_config(config: &RagConfig) -> AppResult<Self> {
        Ok(Self::new(ServiceConnection::from_config(
            config.bedrock_runtime_url(),
            config,
        )?))
    }

    fn to_converse_request(&self, request: &LlmRequest) -> ConverseRequest {
        ConverseRequest {
            messages: vec![ConverseMessage {
                role: "user".to_string(),
                content: vec![ContentBlock {
                    text: Some(request.prompt.clone()),
                }],
            }],
            system: request
                .system
                .iter()
                .map(|s| ContentBlock {
                    text: Some(s.clone()),
                })
                .collect(),
            inference_config: InferenceConfig {
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
            },
        }
    }

    fn convert_response(&self, model: &str, response: ConverseResponse) -> LlmResponse {
        let content = response
            .output
            .message
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        LlmResponse {
            content,
            model: model.to_string(),
            usage,
            latency_ms: response.metrics.map(|m| m.latency_ms),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for BedrockClient {
    fn provider_name(&self) -> &str {
        "bedrock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending converse request for model {}", request.model);
        tracing::debug!("Request: {:?}", request);

        let url = self.connection.url(&["model", &request.model, "converse"])?;
        let body = self.to_converse_request(request);
        let value = self.connection.post_json(url, &body).await?;

        let response: ConverseResponse = serde_json::from_value(value).map_err(|e| {
            AppError::Service(format!("Failed to parse converse response: {}", e))
        })?;

        let response = self.convert_response(&request.model, response);
        tracing::info!(
            "Received converse response ({} tokens)",
            response.usage.total_tokens
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{request_body, serve_once};
    use std::time::Duration;

    fn client(base: &str) -> BedrockClient {
        BedrockClient::new(ServiceConnection::new(base, None, Duration::from_secs(5)).unwrap())
    }

    #[test]
    fn test_request_conversion() {
        let client = client("http://localhost:1");
        let request = LlmRequest::new("Hello", "anthropic.claude-3-haiku")
            .with_system("Be terse")
            .with_max_tokens(100);

        let body = serde_json::to_value(client.to_converse_request(&request)).unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "Hello");
        assert_eq!(body["system"][0]["text"], "Be terse");
        assert_eq!(body["inferenceConfig"]["maxTokens"], 100);
        assert!(body["inferenceConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_request_without_system_or_params() {
        let client = client("http://localhost:1");
        let body =
            serde_json::to_value(client.to_converse_request(&LlmRequest::new("Hi", "m"))).unwrap();
        assert!(body.get("system").is_none());
        assert!(body.get("inferenceConfig").is_none());
    }

    #[tokio::test]
    async fn test_complete_round_trip() {
        let (base, handle) = serve_once(
            200,
            r#"{
                "output": {"message": {"role": "assistant", "content": [{"text": "Paris"}]}},
                "stopReason": "end_turn",
                "usage": {"inputTokens": 12, "outputTokens": 3, "totalTokens": 15},
                "metrics": {"latencyMs": 420}
            }"#,
        )
        .await;

        let response = client(&base)
            .complete(&LlmRequest::new("Capital of France?", "amazon.nova-lite-v1:0"))
            .await
            .unwrap();

        assert_eq!(response.content, "Paris");
        assert_eq!(response.usage, LlmUsage::new(12, 3));
        assert_eq!(response.latency_ms, Some(420));

        let raw = handle.await.unwrap();
        assert!(raw.starts_with("POST /model/amazon.nova-lite-v1:0/converse")
            || raw.starts_with("POST /model/amazon.nova-lite-v1%3A0/converse"));
        assert_eq!(
            request_body(&raw)["messages"][0]["content"][0]["text"],
            "Capital of France?"
        );
    }
}

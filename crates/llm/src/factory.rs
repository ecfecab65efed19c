//! LLM provider factory.
//!
//! Builds a client for the requested backend from the loaded service
//! identifiers.

use crate::client::LlmClient;
use crate::providers::{BedrockClient, EndpointClient};
use crate::types::ProviderType;
use kbrag_core::{AppResult, RagConfig};
use std::sync::Arc;

/// Create an LLM client for `provider`.
///
/// # Errors
/// Fails when the config lacks a key the provider needs (the endpoint
/// name for self-hosted endpoints) or the HTTP client cannot be built.
pub fn create_client(provider: ProviderType, config: &RagConfig) -> AppResult<Arc<dyn LlmClient>> {
    tracing::debug!("Creating {} client", provider.as_str());

    match provider {
        ProviderType::Bedrock => Ok(Arc::new(BedrockClient::from_config(config)?)),
        ProviderType::Endpoint => Ok(Arc::new(EndpointClient::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> RagConfig {
        RagConfig::from_json(&format!(
            r#"{{"kb_id": "KB", "account_number": "1", "region_name": "us-east-1"{}}}"#,
            extra
        ))
        .unwrap()
    }

    #[test]
    fn test_create_bedrock_client() {
        let client = create_client(ProviderType::Bedrock, &config("")).unwrap();
        assert_eq!(client.provider_name(), "bedrock");
    }

    #[test]
    fn test_endpoint_needs_name() {
        assert!(create_client(ProviderType::Endpoint, &config("")).is_err());

        let client =
            create_client(ProviderType::Endpoint, &config(r#", "endpoint_name": "ep""#)).unwrap();
        assert_eq!(client.provider_name(), "endpoint");
    }
}

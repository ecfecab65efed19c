//! Provider selection types.

use serde::{Deserialize, Serialize};

/// Backend kind for text generation outside the knowledge base service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Managed model runtime (Converse API)
    Bedrock,
    /// Self-hosted inference endpoint
    Endpoint,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bedrock" | "converse" => Some(Self::Bedrock),
            "endpoint" | "sagemaker" => Some(Self::Endpoint),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bedrock => "bedrock",
            Self::Endpoint => "endpoint",
        }
    }
}

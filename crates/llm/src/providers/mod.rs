//! LLM provider implementations.

pub mod bedrock;
pub mod endpoint;

pub use bedrock::BedrockClient;
pub use endpoint::EndpointClient;

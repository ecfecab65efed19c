//! Model invocation crate for kbrag.
//!
//! Text generation outside the knowledge base service goes through the
//! `LlmClient` trait:
//! - **Bedrock**: managed model runtime via the Converse API
//! - **Endpoint**: self-hosted inference endpoint with shape-tolerant
//!   response parsing
//!
//! # Example
//! ```no_run
//! use kbrag_llm::{LlmClient, LlmRequest, BedrockClient};
//! use kbrag_core::RagConfig;
//!
//! # async fn example(config: RagConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let client = BedrockClient::from_config(&config)?;
//! let request = LlmRequest::new("Hello, world!", "amazon.nova-lite-v1:0");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod http;
pub mod providers;
pub mod response;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use http::ServiceConnection;
pub use providers::{BedrockClient, EndpointClient};
pub use response::{resolve_generated_text, EndpointOutput};
pub use types::ProviderType;

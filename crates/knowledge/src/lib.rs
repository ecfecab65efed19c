//! Managed knowledge base access.
//!
//! Provides metadata filters, the retrieve / retrieve-and-generate client,
//! and RAG answering flows (managed, self-hosted endpoint, decomposed).
//!
//! # Example
//! ```no_run
//! use kbrag_core::RagConfig;
//! use kbrag_knowledge::{build_equality_filter, rag, GenerateOptions, HttpKnowledgeBaseClient, RetrieveOptions};
//!
//! # async fn example(config: RagConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpKnowledgeBaseClient::from_config(&config)?;
//! let mut options = GenerateOptions::new("anthropic.claude-3-haiku-20240307-v1:0");
//! options.retrieval = RetrieveOptions::default()
//!     .with_top_k(5)
//!     .with_filter(Some(build_equality_filter([("company", "ACME")])));
//!
//! let answer = rag::ask(&client, "What was ACME's Q3 revenue?", &options).await?;
//! println!("{}", answer.answer);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod filter;
pub mod rag;
pub mod types;

// Re-export commonly used types
pub use client::{HttpKnowledgeBaseClient, KnowledgeBaseClient};
pub use filter::{
    build_equality_filter, optional_equality_filter, parse_filter_arg, FilterClause,
    RetrievalFilter,
};
pub use types::{
    ChunkLocation, Citation, GenerateOptions, GuardrailAction, InferenceParams, RagAnswer,
    RetrieveOptions, RetrievedChunk,
};

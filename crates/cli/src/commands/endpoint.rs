//! Endpoint command handler.
//!
//! RAG against a self-hosted inference endpoint. Context comes from the
//! knowledge base only when `--with-kb` is set.

use super::{print_json, retrieve_options};
use clap::Args;
use kbrag_core::{config::AppConfig, AppResult};
use kbrag_knowledge::rag::{self, EndpointParams};
use kbrag_knowledge::{HttpKnowledgeBaseClient, KnowledgeBaseClient};
use kbrag_llm::EndpointClient;

/// Answer a question with a self-hosted inference endpoint
#[derive(Args, Debug)]
pub struct EndpointCommand {
    /// The question to ask
    pub query: String,

    /// Retrieve context from the knowledge base first
    #[arg(long)]
    pub with_kb: bool,

    /// Number of chunks to retrieve (with --with-kb)
    #[arg(short = 'k', long)]
    pub top_k: Option<u32>,

    /// System message replacing the built-in one
    #[arg(long)]
    pub system: Option<String>,

    /// Maximum new tokens to generate
    #[arg(long)]
    pub max_new_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Nucleus sampling threshold
    #[arg(long)]
    pub top_p: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EndpointCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing endpoint command");

        let rag_config = config.load_rag_config()?;
        let llm = EndpointClient::from_config(&rag_config)?;
        tracing::debug!("Endpoint: {}", llm.endpoint_name());

        let kb = if self.with_kb {
            Some(HttpKnowledgeBaseClient::from_config(&rag_config)?)
        } else {
            None
        };

        let params = EndpointParams {
            system: self.system.clone(),
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let answer = rag::ask_endpoint(
            kb.as_ref().map(|kb| kb as &dyn KnowledgeBaseClient),
            &llm,
            &self.query,
            &retrieve_options(&[], self.top_k)?,
            &params,
        )
        .await?;

        if self.json {
            return print_json(&answer);
        }

        println!("{}", answer.answer);
        Ok(())
    }
}

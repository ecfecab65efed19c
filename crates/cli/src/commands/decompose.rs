//! Decompose command handler.

use super::{parse_provider, print_json, retrieve_options};
use clap::Args;
use kbrag_core::{config::AppConfig, AppResult};
use kbrag_knowledge::{rag, HttpKnowledgeBaseClient};
use kbrag_llm::create_client;

/// Split a compound question, retrieve per part, then answer
#[derive(Args, Debug)]
pub struct DecomposeCommand {
    /// The question to ask
    pub query: String,

    /// Model used for decomposition and the final answer
    #[arg(short, long)]
    pub model: Option<String>,

    /// Backend for decomposition and the final answer (bedrock, endpoint)
    #[arg(long, default_value = "bedrock")]
    pub provider: String,

    /// Metadata filter as key=value (repeatable, AND-ed)
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,

    /// Number of chunks to retrieve per sub-question
    #[arg(short = 'k', long)]
    pub top_k: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DecomposeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing decompose command");

        let rag_config = config.load_rag_config()?;
        let model = rag_config.resolve_model_id(self.model.as_deref())?;
        let kb = HttpKnowledgeBaseClient::from_config(&rag_config)?;
        let llm = create_client(parse_provider(&self.provider)?, &rag_config)?;
        let retrieval = retrieve_options(&self.filters, self.top_k)?;

        let result = rag::answer_decomposed(
            &config.workspace,
            &kb,
            llm.as_ref(),
            &model,
            &self.query,
            &retrieval,
        )
        .await?;

        if self.json {
            return print_json(&result);
        }

        println!("Sub-questions:");
        for (i, q) in result.sub_questions.iter().enumerate() {
            println!("  {}. {}", i + 1, q);
        }
        println!("\n{}", result.answer);
        println!("\n({} supporting chunks)", result.context.len());

        Ok(())
    }
}

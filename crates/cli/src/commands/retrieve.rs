//! Retrieve command handler.

use super::{print_json, retrieve_options};
use clap::Args;
use kbrag_core::{config::AppConfig, AppResult};
use kbrag_knowledge::rag::{self, RagSourceRef};
use kbrag_knowledge::HttpKnowledgeBaseClient;

/// Retrieve matching chunks from the knowledge base
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Query text
    pub query: String,

    /// Metadata filter as key=value (repeatable, AND-ed)
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command");

        let rag_config = config.load_rag_config()?;
        let client = HttpKnowledgeBaseClient::from_config(&rag_config)?;
        let options = retrieve_options(&self.filters, self.top_k)?;

        let chunks = rag::retrieve(&client, &self.query, &options).await?;

        if self.json {
            return print_json(&chunks);
        }

        if chunks.is_empty() {
            println!("No matching chunks.");
            return Ok(());
        }

        for (i, chunk) in chunks.iter().enumerate() {
            let source = RagSourceRef::from_chunk(chunk);
            match chunk.score {
                Some(score) => println!("[{}] {} (score: {:.3})", i + 1, source.location, score),
                None => println!("[{}] {}", i + 1, source.location),
            }
            println!("    {}", source.snippet);
        }

        Ok(())
    }
}

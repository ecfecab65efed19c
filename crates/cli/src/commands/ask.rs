//! Ask command handler.
//!
//! Answers a question with one managed retrieve-and-generate call.

use super::{print_json, retrieve_options};
use clap::Args;
use kbrag_core::{config::AppConfig, AppError, AppResult};
use kbrag_knowledge::rag::{self, sources_for};
use kbrag_knowledge::{GenerateOptions, GuardrailAction, HttpKnowledgeBaseClient};
use kbrag_prompt::{load_prompt, PromptKind};

/// Answer a question with managed retrieve-and-generate
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Metadata filter as key=value (repeatable, AND-ed)
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<u32>,

    /// Generation model id or ARN (default: default_model_id from config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Apply the configured guardrail
    #[arg(long)]
    pub guardrail: bool,

    /// Prompt definition id for the generation template (kind: kb)
    #[arg(long)]
    pub prompt: Option<String>,

    /// Maximum tokens in response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature for response generation
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let rag_config = config.load_rag_config()?;
        let client = HttpKnowledgeBaseClient::from_config(&rag_config)?;

        let mut options = GenerateOptions::new(rag_config.resolve_model_id(self.model.as_deref())?);
        options.retrieval = retrieve_options(&self.filters, self.top_k)?;
        options.inference.max_tokens = self.max_tokens;
        options.inference.temperature = self.temperature;

        if self.guardrail {
            options.guardrail = Some(rag_config.require_guardrail()?);
        }

        if let Some(ref prompt_id) = self.prompt {
            let def = load_prompt(&config.workspace, prompt_id)?;
            if def.kind != PromptKind::Kb {
                return Err(AppError::Prompt(format!(
                    "Prompt '{}' is not a knowledge base template (kind: kb)",
                    prompt_id
                )));
            }
            tracing::debug!("Using generation template: {}", def.id);
            options.prompt_template = Some(def.template);
        }

        let answer = rag::ask(&client, &self.query, &options).await?;

        if self.json {
            return print_json(&answer);
        }

        println!("{}", answer.answer);

        if answer.guardrail_action == GuardrailAction::Intervened {
            eprintln!("\n(guardrail intervened)");
        }

        let sources = sources_for(&answer);
        if !sources.is_empty() {
            println!("\nSources:");
            for source in sources {
                println!("  - {} ({})", source.source, source.location);
            }
        }

        Ok(())
    }
}

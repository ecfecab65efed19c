//! Sweep command handler.

use super::retrieve_options;
use clap::Args;
use kbrag_core::{config::AppConfig, AppError, AppResult};
use kbrag_eval::{load_questions, run_sweep, write_json_pretty};
use kbrag_knowledge::{GenerateOptions, HttpKnowledgeBaseClient};
use std::path::PathBuf;

/// Answer a question set with several models
#[derive(Args, Debug)]
pub struct SweepCommand {
    /// JSON file with the questions
    #[arg(short, long)]
    pub questions: PathBuf,

    /// Generation model id or ARN (repeatable, run in order)
    #[arg(short, long = "model", required = true)]
    pub models: Vec<String>,

    /// Result file (default: <workspace>/.kbrag/results/sweep.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Metadata filter as key=value (repeatable, AND-ed)
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<u32>,

    /// Apply the configured guardrail
    #[arg(long)]
    pub guardrail: bool,
}

impl SweepCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing sweep command with {} models", self.models.len());

        let rag_config = config.load_rag_config()?;
        let client = HttpKnowledgeBaseClient::from_config(&rag_config)?;
        let questions = load_questions(&self.questions)?;

        let mut base = GenerateOptions::new("");
        base.retrieval = retrieve_options(&self.filters, self.top_k)?;
        if self.guardrail {
            base.guardrail = Some(rag_config.require_guardrail()?);
        }

        let report = run_sweep(&client, &base, &self.models, &questions).await?;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.kbrag_dir().join("results/sweep.json"));
        write_json_pretty(&output, &report)?;

        for run in &report.runs {
            match &run.error {
                Some(e) => println!(
                    "{}: {}/{} answered, failed: {}",
                    run.model_id,
                    run.results.len(),
                    questions.len(),
                    e
                ),
                None => println!("{}: {}/{} answered", run.model_id, run.results.len(), questions.len()),
            }
        }
        println!("Results written to {}", output.display());

        let failed = report.failed_models().count();
        if failed == report.runs.len() {
            return Err(AppError::Service(format!("All {} models failed", failed)));
        }

        Ok(())
    }
}

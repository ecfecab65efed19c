//! Evaluate command handler.
//!
//! Grades a sweep result file, then merges sweep latencies and any
//! external metrics file into the per-model records.

use super::parse_provider;
use clap::Args;
use kbrag_core::{config::AppConfig, AppError, AppResult};
use kbrag_eval::{
    evaluate_sweep, latency_metrics, load_ground_truth, load_metrics, merge_metrics, read_json,
    write_json_pretty, LlmJudge, SweepReport,
};
use kbrag_llm::create_client;
use std::path::PathBuf;

/// Grade sweep results against ground truth
#[derive(Args, Debug)]
pub struct EvaluateCommand {
    /// Sweep result file
    #[arg(short, long)]
    pub results: PathBuf,

    /// Per-model cost/latency figures to merge in
    #[arg(long)]
    pub metrics: Option<PathBuf>,

    /// Ground truth file (default: ground_truth_data_path from config)
    #[arg(long)]
    pub ground_truth: Option<PathBuf>,

    /// Judge model (default: judge_model_id, then default_model_id)
    #[arg(long)]
    pub judge_model: Option<String>,

    /// Backend hosting the judge model (bedrock, endpoint)
    #[arg(long, default_value = "bedrock")]
    pub provider: String,

    /// Evaluation file (default: <workspace>/.kbrag/results/evaluation.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl EvaluateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing evaluate command");

        let rag_config = config.load_rag_config()?;

        let ground_truth_path = match self.ground_truth {
            Some(ref path) => path.clone(),
            None => rag_config.require_ground_truth_path()?.to_path_buf(),
        };
        let ground_truth = load_ground_truth(&ground_truth_path).map_err(|e| {
            AppError::Evaluation(format!("Cannot load ground truth: {}", e))
        })?;

        let judge_model = match self.judge_model.as_deref() {
            Some(model) => model.to_string(),
            None => rag_config.resolve_model_id(rag_config.judge_model_id.as_deref())?,
        };

        let sweep: SweepReport = read_json(&self.results)?;
        let llm = create_client(parse_provider(&self.provider)?, &rag_config)?;
        let judge = LlmJudge::new(&config.workspace, llm, judge_model.as_str())?;

        let mut report = evaluate_sweep(&judge, judge.model(), &sweep, &ground_truth).await?;

        merge_metrics(&mut report, &latency_metrics(&sweep));
        if let Some(ref path) = self.metrics {
            merge_metrics(&mut report, &load_metrics(path)?);
        }

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.kbrag_dir().join("results/evaluation.json"));
        write_json_pretty(&output, &report)?;

        for (model_id, record) in report.models.iter() {
            let accuracy = record
                .accuracy
                .map(|a| format!("{:.1}%", a * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            let cost = record
                .metrics
                .cost_usd
                .map(|c| format!(", ${:.4}", c))
                .unwrap_or_default();
            println!(
                "{}: {} correct, {} missing, {} incorrect ({}{})",
                model_id,
                record.tally.correct,
                record.tally.missing,
                record.tally.incorrect,
                accuracy,
                cost
            );
        }
        println!("Evaluation written to {}", output.display());

        Ok(())
    }
}

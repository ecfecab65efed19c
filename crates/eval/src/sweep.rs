//! Multi-model sweep.
//!
//! Runs the same question set through retrieve-and-generate once per model.
//! Models run one after another; a failing model keeps whatever it answered
//! before the failure and the sweep moves on to the next one.

use crate::types::{ModelMetrics, ModelRun, OrderedMap, QuestionResult, SweepReport};
use kbrag_core::{AppError, AppResult};
use kbrag_knowledge::{GenerateOptions, KnowledgeBaseClient};
use std::collections::HashSet;
use std::time::Instant;

/// Answer every question with every model, in input order.
///
/// `base` carries retrieval, guardrail and prompt settings shared by all
/// models; its `model_id` is replaced per model.
///
/// Model ids key the result file, so a repeated id is rejected before any
/// call is made. Per-model call failures never surface here.
pub async fn run_sweep(
    kb: &dyn KnowledgeBaseClient,
    base: &GenerateOptions,
    models: &[String],
    questions: &[String],
) -> AppResult<SweepReport> {
    let mut seen = HashSet::new();
    if let Some(repeated) = models.iter().find(|m| !seen.insert(m.as_str())) {
        return Err(AppError::Config(format!(
            "Model '{}' is listed more than once",
            repeated
        )));
    }

    let mut report = SweepReport::default();

    for model_id in models {
        let mut options = base.clone();
        options.model_id = model_id.clone();

        let mut run = ModelRun {
            model_id: model_id.clone(),
            results: Vec::with_capacity(questions.len()),
            error: None,
        };

        for (i, question) in questions.iter().enumerate() {
            let started = Instant::now();
            match kb.retrieve_and_generate(question, &options).await {
                Ok(answer) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    tracing::debug!("Model {} answered question {} in {}ms", model_id, i + 1, latency_ms);
                    run.results.push(QuestionResult { answer, latency_ms });
                }
                Err(e) => {
                    tracing::error!("Model {} failed on question {}: {}", model_id, i + 1, e);
                    run.error = Some(e.to_string());
                    break;
                }
            }
        }

        tracing::info!(
            "Model {} answered {}/{} questions",
            model_id,
            run.results.len(),
            questions.len()
        );
        report.runs.push(run);
    }

    Ok(report)
}

/// Latency figures per model, from the sweep's recorded call times.
///
/// Models without results are left out.
pub fn latency_metrics(report: &SweepReport) -> OrderedMap<ModelMetrics> {
    let mut metrics = OrderedMap::new();

    for run in &report.runs {
        let mut latencies: Vec<u64> = run.results.iter().map(|r| r.latency_ms).collect();
        if latencies.is_empty() {
            continue;
        }
        latencies.sort_unstable();

        let total: u64 = latencies.iter().sum();
        let mean = total as f64 / latencies.len() as f64;
        let p50 = latencies[(latencies.len() - 1) / 2] as f64;
        let max = latencies[latencies.len() - 1] as f64;

        metrics.insert(
            run.model_id.clone(),
            ModelMetrics {
                cost_usd: None,
                mean_latency_ms: Some(mean),
                p50_latency_ms: Some(p50),
                max_latency_ms: Some(max),
            },
        );
    }

    metrics
}

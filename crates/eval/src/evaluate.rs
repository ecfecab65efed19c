//! Correctness evaluation and metrics merging.

use crate::dataset::GroundTruth;
use crate::judge::Judge;
use crate::types::{
    Correctness, EvaluationReport, Judgment, ModelMetrics, ModelRecord, OrderedMap, SweepReport,
};
use kbrag_core::AppResult;
use std::collections::HashMap;

/// Grade every sweep answer that has a ground truth.
///
/// Empty answers count as missing without asking the judge. Questions with
/// no ground truth are skipped. A judge failure aborts the evaluation.
pub async fn evaluate_sweep(
    judge: &dyn Judge,
    judge_model: &str,
    sweep: &SweepReport,
    ground_truth: &[GroundTruth],
) -> AppResult<EvaluationReport> {
    let references: HashMap<&str, &str> = ground_truth
        .iter()
        .map(|gt| (gt.question.trim(), gt.ground_truth.as_str()))
        .collect();

    let mut report = EvaluationReport::new(judge_model);

    for run in &sweep.runs {
        let mut record = ModelRecord::default();

        for result in &run.results {
            let question = result.answer.question.as_str();
            let Some(reference) = references.get(question.trim()) else {
                tracing::warn!("No ground truth for question: {}", question);
                continue;
            };

            let answer = result.answer.answer.trim();
            let verdict = if answer.is_empty() {
                Correctness::Missing
            } else {
                judge.classify(question, answer, reference).await?
            };

            record.tally.record(verdict);
            record.judgments.push(Judgment {
                question: question.to_string(),
                answer: answer.to_string(),
                ground_truth: reference.to_string(),
                verdict,
            });
        }

        record.accuracy = record.tally.accuracy();
        tracing::info!(
            "{}: {} correct, {} missing, {} incorrect",
            run.model_id,
            record.tally.correct,
            record.tally.missing,
            record.tally.incorrect
        );
        report.models.insert(run.model_id.clone(), record);
    }

    Ok(report)
}

/// Fold per-model metrics into the evaluation records.
///
/// Each update touches only the record of its own model; models not yet in
/// the report get a fresh record.
pub fn merge_metrics(report: &mut EvaluationReport, updates: &OrderedMap<ModelMetrics>) {
    for (model_id, metrics) in updates.iter() {
        let record = report
            .models
            .get_or_insert_with(model_id, ModelRecord::default);
        record.metrics.merge_from(metrics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelRun, QuestionResult};
    use async_trait::async_trait;
    use kbrag_core::AppError;
    use kbrag_knowledge::{GuardrailAction, RagAnswer};
    use std::sync::Mutex;

    /// Correct when the answer contains the reference text.
    #[derive(Default)]
    struct ContainsJudge {
        calls: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl Judge for ContainsJudge {
        async fn classify(
            &self,
            _question: &str,
            answer: &str,
            ground_truth: &str,
        ) -> AppResult<Correctness> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(AppError::Evaluation("judge down".to_string()));
            }
            if answer.contains(ground_truth) {
                Ok(Correctness::Correct)
            } else if answer.contains("don't know") {
                Ok(Correctness::Missing)
            } else {
                Ok(Correctness::Incorrect)
            }
        }
    }

    fn result(question: &str, answer: &str) -> QuestionResult {
        QuestionResult {
            answer: RagAnswer {
                question: question.to_string(),
                answer: answer.to_string(),
                context: Vec::new(),
                citations: Vec::new(),
                guardrail_action: GuardrailAction::None,
                session_id: None,
            },
            latency_ms: 5,
        }
    }

    fn ground_truth() -> Vec<GroundTruth> {
        vec![
            GroundTruth {
                question: "Capital of France?".to_string(),
                ground_truth: "Paris".to_string(),
            },
            GroundTruth {
                question: "Capital of Peru?".to_string(),
                ground_truth: "Lima".to_string(),
            },
        ]
    }

    fn sweep() -> SweepReport {
        SweepReport {
            runs: vec![
                ModelRun {
                    model_id: "good".to_string(),
                    results: vec![
                        result("Capital of France?", "It is Paris."),
                        result("Capital of Peru?", "Lima."),
                    ],
                    error: None,
                },
                ModelRun {
                    model_id: "shaky".to_string(),
                    results: vec![
                        result("Capital of France?", "I don't know."),
                        result("Capital of Peru?", "Cusco"),
                        result("Unlisted question?", "whatever"),
                    ],
                    error: None,
                },
                ModelRun {
                    model_id: "silent".to_string(),
                    results: vec![result("Capital of France?", "   ")],
                    error: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_tallies_per_model() {
        let judge = ContainsJudge::default();
        let report = evaluate_sweep(&judge, "judge-m", &sweep(), &ground_truth())
            .await
            .unwrap();

        assert_eq!(report.judge_model, "judge-m");
        assert_eq!(
            report.models.keys().collect::<Vec<_>>(),
            vec!["good", "shaky", "silent"]
        );

        let good = report.models.get("good").unwrap();
        assert_eq!(good.tally.correct, 2);
        assert_eq!(good.accuracy, Some(1.0));

        let shaky = report.models.get("shaky").unwrap();
        assert_eq!(shaky.tally.missing, 1);
        assert_eq!(shaky.tally.incorrect, 1);
        assert_eq!(shaky.tally.total(), 2);

        let silent = report.models.get("silent").unwrap();
        assert_eq!(silent.tally.missing, 1);

        // Empty answer and unlisted question never reach the judge
        assert_eq!(*judge.calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_judge_failure_aborts() {
        let judge = ContainsJudge {
            fail: true,
            ..Default::default()
        };
        let result = evaluate_sweep(&judge, "j", &sweep(), &ground_truth()).await;
        assert!(matches!(result, Err(AppError::Evaluation(_))));
    }

    #[test]
    fn test_merge_metrics_stays_per_model() {
        let mut report = EvaluationReport::new("j");
        report.models.insert("a", ModelRecord::default());
        report.models.insert("b", ModelRecord::default());

        let mut latencies = OrderedMap::new();
        latencies.insert(
            "a",
            ModelMetrics {
                mean_latency_ms: Some(100.0),
                ..Default::default()
            },
        );
        latencies.insert(
            "b",
            ModelMetrics {
                mean_latency_ms: Some(900.0),
                ..Default::default()
            },
        );
        merge_metrics(&mut report, &latencies);

        let mut costs = OrderedMap::new();
        costs.insert(
            "b",
            ModelMetrics {
                cost_usd: Some(2.5),
                ..Default::default()
            },
        );
        merge_metrics(&mut report, &costs);

        let a = &report.models.get("a").unwrap().metrics;
        assert_eq!(a.mean_latency_ms, Some(100.0));
        assert_eq!(a.cost_usd, None);

        let b = &report.models.get("b").unwrap().metrics;
        assert_eq!(b.mean_latency_ms, Some(900.0));
        assert_eq!(b.cost_usd, Some(2.5));
    }

    #[test]
    fn test_merge_later_values_win() {
        let mut report = EvaluationReport::new("j");
        let update = |ms| {
            let mut m = OrderedMap::new();
            m.insert(
                "a",
                ModelMetrics {
                    p50_latency_ms: Some(ms),
                    ..Default::default()
                },
            );
            m
        };

        merge_metrics(&mut report, &update(10.0));
        merge_metrics(&mut report, &update(20.0));

        assert_eq!(report.models.len(), 1);
        assert_eq!(
            report.models.get("a").unwrap().metrics.p50_latency_ms,
            Some(20.0)
        );
    }

    #[tokio::test]
    async fn test_report_serializes_in_model_order() {
        let judge = ContainsJudge::default();
        let report = evaluate_sweep(&judge, "j", &sweep(), &ground_truth())
            .await
            .unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let good = json.find("\"good\"").unwrap();
        let shaky = json.find("\"shaky\"").unwrap();
        let silent = json.find("\"silent\"").unwrap();
        assert!(good < shaky && shaky < silent);
    }
}

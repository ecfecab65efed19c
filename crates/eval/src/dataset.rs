//! Question, ground truth and metrics files.

use crate::types::{ModelMetrics, OrderedMap};
use kbrag_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A question paired with its reference answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub question: String,

    #[serde(alias = "answer", alias = "reference")]
    pub ground_truth: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionEntry {
    Text(String),
    Record { question: String },
}

/// Load a question list.
///
/// Accepts a JSON array of strings, or of objects with a `question` field
/// (so a ground truth file doubles as a question file).
pub fn load_questions(path: &Path) -> AppResult<Vec<String>> {
    let entries: Vec<QuestionEntry> = read_json_file(path, "question")?;
    let questions: Vec<String> = entries
        .into_iter()
        .map(|entry| match entry {
            QuestionEntry::Text(q) | QuestionEntry::Record { question: q } => q.trim().to_string(),
        })
        .filter(|q| !q.is_empty())
        .collect();

    if questions.is_empty() {
        return Err(AppError::Config(format!(
            "No questions found in {}",
            path.display()
        )));
    }

    tracing::info!("Loaded {} questions from {:?}", questions.len(), path);
    Ok(questions)
}

pub fn load_ground_truth(path: &Path) -> AppResult<Vec<GroundTruth>> {
    let records: Vec<GroundTruth> = read_json_file(path, "ground truth")?;
    tracing::info!("Loaded {} ground truth records from {:?}", records.len(), path);
    Ok(records)
}

/// Load externally computed per-model metrics, `{model_id: {...}, ...}`.
pub fn load_metrics(path: &Path) -> AppResult<OrderedMap<ModelMetrics>> {
    read_json_file(path, "metrics")
}

fn read_json_file<T: DeserializeOwned>(path: &Path, what: &str) -> AppResult<T> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "{} file not found: {}",
            what,
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::Config(format!("Invalid {} file {}: {}", what, path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_questions_from_strings_and_records() {
        let dir = TempDir::new().unwrap();
        let plain = write(&dir, "q.json", r#"["What is RAG?", "  ", "Who owns ACME?"]"#);
        assert_eq!(
            load_questions(&plain).unwrap(),
            vec!["What is RAG?", "Who owns ACME?"]
        );

        let records = write(
            &dir,
            "gt.json",
            r#"[{"question": "What is RAG?", "ground_truth": "Retrieval plus generation"}]"#,
        );
        assert_eq!(load_questions(&records).unwrap(), vec!["What is RAG?"]);
    }

    #[test]
    fn test_empty_question_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "q.json", "[]");
        assert!(matches!(load_questions(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_ground_truth_aliases() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "gt.json",
            r#"[{"question": "Q1", "answer": "A1"}, {"question": "Q2", "ground_truth": "A2"}]"#,
        );
        let records = load_ground_truth(&path).unwrap();
        assert_eq!(records[0].ground_truth, "A1");
        assert_eq!(records[1].ground_truth, "A2");
    }

    #[test]
    fn test_missing_file() {
        let err = load_ground_truth(Path::new("/nonexistent/gt.json")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_metrics_file_keeps_order() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "metrics.json",
            r#"{"b": {"cost_usd": 0.5}, "a": {"mean_latency_ms": 120.0}}"#,
        );
        let metrics = load_metrics(&path).unwrap();
        assert_eq!(metrics.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(metrics.get("b").unwrap().cost_usd, Some(0.5));
    }
}

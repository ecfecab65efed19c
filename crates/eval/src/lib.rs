//! Multi-model comparison and answer grading.
//!
//! A sweep answers one question set with several models through the
//! knowledge base. Evaluation grades each answer against ground truth as
//! correct, missing or incorrect, then merges cost and latency figures into
//! the per-model records.

pub mod dataset;
pub mod evaluate;
pub mod judge;
pub mod report;
pub mod sweep;
pub mod types;

pub use dataset::{load_ground_truth, load_metrics, load_questions, GroundTruth};
pub use evaluate::{evaluate_sweep, merge_metrics};
pub use judge::{parse_verdict, Judge, LlmJudge};
pub use report::{read_json, write_json_pretty};
pub use sweep::{latency_metrics, run_sweep};
pub use types::{
    Correctness, CorrectnessTally, EvaluationReport, Judgment, ModelMetrics, ModelRecord,
    ModelRun, OrderedMap, QuestionResult, SweepReport,
};

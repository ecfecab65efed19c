//! Sweep and evaluation types.

use kbrag_knowledge::RagAnswer;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// String-keyed map that keeps insertion order, in memory and in JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace in place; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Value for `key`, appending `default()` first if absent.
    pub fn get_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> V) -> &mut V {
        let idx = match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key.to_string(), default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map keyed by model id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// One answered question within a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    #[serde(flatten)]
    pub answer: RagAnswer,

    /// Wall-clock time of the call
    pub latency_ms: u64,
}

/// One model's pass over the question set.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    pub model_id: String,

    /// Results in question order, up to the first failure
    pub results: Vec<QuestionResult>,

    /// Failure that ended this model's pass early
    pub error: Option<String>,
}

/// Output of a multi-model sweep, in input model order.
///
/// Serialized as `{model_id: [result, ...], ...}`. Errors are not part of
/// the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub runs: Vec<ModelRun>,
}

impl SweepReport {
    pub fn run(&self, model_id: &str) -> Option<&ModelRun> {
        self.runs.iter().find(|r| r.model_id == model_id)
    }

    pub fn failed_models(&self) -> impl Iterator<Item = &ModelRun> {
        self.runs.iter().filter(|r| r.error.is_some())
    }
}

impl Serialize for SweepReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.runs.iter().map(|r| (&r.model_id, &r.results)))
    }
}

impl<'de> Deserialize<'de> for SweepReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SweepVisitor;

        impl<'de> Visitor<'de> for SweepVisitor {
            type Value = SweepReport;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of model id to result list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut report = SweepReport::default();
                while let Some((model_id, results)) =
                    access.next_entry::<String, Vec<QuestionResult>>()?
                {
                    if report.run(&model_id).is_some() {
                        return Err(de::Error::custom(format!(
                            "duplicate model id '{}'",
                            model_id
                        )));
                    }
                    report.runs.push(ModelRun {
                        model_id,
                        results,
                        error: None,
                    });
                }
                Ok(report)
            }
        }

        deserializer.deserialize_map(SweepVisitor)
    }
}

/// Correctness category assigned by the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    Correct,
    Missing,
    Incorrect,
}

/// Per-category counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessTally {
    pub correct: u32,
    pub missing: u32,
    pub incorrect: u32,
}

impl CorrectnessTally {
    pub fn record(&mut self, verdict: Correctness) {
        match verdict {
            Correctness::Correct => self.correct += 1,
            Correctness::Missing => self.missing += 1,
            Correctness::Incorrect => self.incorrect += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.correct + self.missing + self.incorrect
    }

    /// Share of correct answers, `None` when nothing was judged.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.correct as f64 / total as f64),
        }
    }
}

/// Cost and latency figures for one model.
///
/// Merging copies every field present in the update; absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_latency_ms: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p50_latency_ms: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_latency_ms: Option<f64>,
}

impl ModelMetrics {
    pub fn merge_from(&mut self, update: &ModelMetrics) {
        if update.cost_usd.is_some() {
            self.cost_usd = update.cost_usd;
        }
        if update.mean_latency_ms.is_some() {
            self.mean_latency_ms = update.mean_latency_ms;
        }
        if update.p50_latency_ms.is_some() {
            self.p50_latency_ms = update.p50_latency_ms;
        }
        if update.max_latency_ms.is_some() {
            self.max_latency_ms = update.max_latency_ms;
        }
    }
}

/// The judge's verdict on one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub question: String,
    pub answer: String,
    pub ground_truth: String,
    pub verdict: Correctness,
}

/// Everything known about one model after evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub tally: CorrectnessTally,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,

    #[serde(flatten)]
    pub metrics: ModelMetrics,

    #[serde(default)]
    pub judgments: Vec<Judgment>,
}

/// Evaluation output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub run_id: uuid::Uuid,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub judge_model: String,
    pub models: OrderedMap<ModelRecord>,
}

impl EvaluationReport {
    pub fn new(judge_model: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            generated_at: chrono::Utc::now(),
            judge_model: judge_model.into(),
            models: OrderedMap::new(),
        }
    }
}

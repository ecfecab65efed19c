//! Knowledge base request and response types.

use crate::filter::RetrievalFilter;
use kbrag_core::config::GuardrailRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Vector search parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrieveOptions {
    /// Number of chunks to return (service default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<RetrievalFilter>,
}

impl RetrieveOptions {
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_filter(mut self, filter: Option<RetrievalFilter>) -> Self {
        self.filter = filter;
        self
    }
}

/// Text generation parameters forwarded to the generating model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl InferenceParams {
    pub fn is_empty(&self) -> bool {
        self.max_tokens.is_none() && self.temperature.is_none() && self.top_p.is_none()
    }
}

/// Parameters for one retrieve-and-generate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Model id or ARN used for generation
    pub model_id: String,

    pub retrieval: RetrieveOptions,

    /// Template with `$search_results$`, filled in by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardrail: Option<GuardrailRef>,

    #[serde(default)]
    pub inference: InferenceParams,
}

impl GenerateOptions {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            retrieval: RetrieveOptions::default(),
            prompt_template: None,
            guardrail: None,
            inference: InferenceParams::default(),
        }
    }
}

/// Where a retrieved chunk came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkLocation {
    /// Source type reported by the service (e.g. "S3", "WEB")
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Document URI or URL, when the source exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl ChunkLocation {
    /// Read a service location object such as
    /// `{"type": "S3", "s3Location": {"uri": "s3://..."}}`.
    pub fn from_service(value: &Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // Each source type nests its address under its own key
        let uri = value.as_object().and_then(|obj| {
            obj.values().find_map(|nested| {
                nested
                    .get("uri")
                    .or_else(|| nested.get("url"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
        });

        Self { kind, uri }
    }
}

/// A chunk returned by vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,

    pub location: ChunkLocation,

    /// Relevance score (only on plain retrieval)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// A span of the answer and the chunks backing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// The cited part of the generated answer
    pub generated_text: String,

    /// Character span of `generated_text` within the answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<(u32, u32)>,

    pub references: Vec<RetrievedChunk>,
}

/// Whether a guardrail rewrote or blocked the answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardrailAction {
    Intervened,
    #[default]
    None,
}

/// A question and the generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub question: String,

    pub answer: String,

    /// Chunks the answer was generated from
    #[serde(default)]
    pub context: Vec<RetrievedChunk>,

    #[serde(default)]
    pub citations: Vec<Citation>,

    #[serde(default)]
    pub guardrail_action: GuardrailAction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

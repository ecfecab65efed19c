//! Knowledge base service client.
//!
//! Two operations, one POST each:
//! - `retrieve`: `POST /knowledgebases/{id}/retrieve`
//! - `retrieve_and_generate`: `POST /retrieveAndGenerate`
//!
//! No retries. Any transport or service error aborts the call.

use crate::types::{
    Citation, ChunkLocation, GenerateOptions, GuardrailAction, RagAnswer, RetrieveOptions,
    RetrievedChunk,
};
use kbrag_core::{AppError, AppResult, RagConfig};
use kbrag_llm::ServiceConnection;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Access to a managed knowledge base.
#[async_trait::async_trait]
pub trait KnowledgeBaseClient: Send + Sync {
    /// Vector search only.
    async fn retrieve(&self, query: &str, options: &RetrieveOptions)
        -> AppResult<Vec<RetrievedChunk>>;

    /// Vector search followed by answer generation.
    async fn retrieve_and_generate(
        &self,
        query: &str,
        options: &GenerateOptions,
    ) -> AppResult<RagAnswer>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieval_results: Vec<WireChunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    output: WireOutput,
    #[serde(default)]
    citations: Vec<WireCitation>,
    #[serde(default)]
    guardrail_action: Option<GuardrailAction>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireOutput {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCitation {
    #[serde(default)]
    generated_response_part: Option<WireResponsePart>,
    #[serde(default)]
    retrieved_references: Vec<WireChunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponsePart {
    text_response_part: Option<WireTextPart>,
}

#[derive(Debug, Deserialize)]
struct WireTextPart {
    #[serde(default)]
    text: String,
    #[serde(default)]
    span: Option<WireSpan>,
}

#[derive(Debug, Deserialize)]
struct WireSpan {
    start: u32,
    end: u32,
}

#[derive(Debug, Deserialize)]
struct WireChunk {
    content: WireContent,
    #[serde(default)]
    location: Value,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    text: String,
}

impl From<WireChunk> for RetrievedChunk {
    fn from(chunk: WireChunk) -> Self {
        Self {
            text: chunk.content.text,
            location: ChunkLocation::from_service(&chunk.location),
            score: chunk.score,
            metadata: chunk.metadata.unwrap_or_default(),
        }
    }
}

/// HTTP client for the knowledge base runtime.
pub struct HttpKnowledgeBaseClient {
    connection: ServiceConnection,
    config: RagConfig,
}

impl HttpKnowledgeBaseClient {
    pub fn new(connection: ServiceConnection, config: RagConfig) -> Self {
        Self { connection, config }
    }

    /// Client for the knowledge base named in the config.
    pub fn from_config(config: &RagConfig) -> AppResult<Self> {
        Ok(Self::new(
            ServiceConnection::from_config(config.agent_runtime_url(), config)?,
            config.clone(),
        ))
    }

    fn vector_search_config(options: &RetrieveOptions) -> Value {
        let mut search = Map::new();
        if let Some(top_k) = options.top_k {
            search.insert("numberOfResults".to_string(), json!(top_k));
        }
        if let Some(ref filter) = options.filter {
            search.insert("filter".to_string(), json!(filter));
        }
        json!({ "vectorSearchConfiguration": search })
    }

    fn retrieve_body(query: &str, options: &RetrieveOptions) -> Value {
        let mut body = json!({ "retrievalQuery": { "text": query } });
        if options.top_k.is_some() || options.filter.is_some() {
            body["retrievalConfiguration"] = Self::vector_search_config(options);
        }
        body
    }

    fn generate_body(&self, query: &str, options: &GenerateOptions) -> Value {
        let mut kb_config = json!({
            "knowledgeBaseId": self.config.knowledge_base_id,
            "modelArn": self.config.model_arn(&options.model_id),
        });

        if options.retrieval.top_k.is_some() || options.retrieval.filter.is_some() {
            kb_config["retrievalConfiguration"] = Self::vector_search_config(&options.retrieval);
        }

        let mut generation = Map::new();
        if let Some(ref template) = options.prompt_template {
            generation.insert(
                "promptTemplate".to_string(),
                json!({ "textPromptTemplate": template }),
            );
        }
        if let Some(ref guardrail) = options.guardrail {
            generation.insert(
                "guardrailConfiguration".to_string(),
                json!({
                    "guardrailId": guardrail.id,
                    "guardrailVersion": guardrail.version,
                }),
            );
        }
        if !options.inference.is_empty() {
            let mut text = Map::new();
            if let Some(max_tokens) = options.inference.max_tokens {
                text.insert("maxTokens".to_string(), json!(max_tokens));
            }
            if let Some(temperature) = options.inference.temperature {
                text.insert("temperature".to_string(), json!(temperature));
            }
            if let Some(top_p) = options.inference.top_p {
                text.insert("topP".to_string(), json!(top_p));
            }
            generation.insert(
                "inferenceConfig".to_string(),
                json!({ "textInferenceConfig": text }),
            );
        }
        if !generation.is_empty() {
            kb_config["generationConfiguration"] = Value::Object(generation);
        }

        json!({
            "input": { "text": query },
            "retrieveAndGenerateConfiguration": {
                "type": "KNOWLEDGE_BASE",
                "knowledgeBaseConfiguration": kb_config,
            }
        })
    }
}

fn convert_generate_response(query: &str, response: GenerateResponse) -> RagAnswer {
    let citations: Vec<Citation> = response
        .citations
        .into_iter()
        .map(|citation| {
            let text_part = citation
                .generated_response_part
                .and_then(|part| part.text_response_part);
            Citation {
                generated_text: text_part
                    .as_ref()
                    .map(|t| t.text.clone())
                    .unwrap_or_default(),
                span: text_part
                    .and_then(|t| t.span)
                    .map(|span| (span.start, span.end)),
                references: citation
                    .retrieved_references
                    .into_iter()
                    .map(RetrievedChunk::from)
                    .collect(),
            }
        })
        .collect();

    // Each referenced chunk once, in citation order
    let mut context: Vec<RetrievedChunk> = Vec::new();
    for reference in citations.iter().flat_map(|c| c.references.iter()) {
        if !context.contains(reference) {
            context.push(reference.clone());
        }
    }

    RagAnswer {
        question: query.to_string(),
        answer: response.output.text,
        context,
        citations,
        guardrail_action: response.guardrail_action.unwrap_or_default(),
        session_id: response.session_id,
    }
}

#[async_trait::async_trait]
impl KnowledgeBaseClient for HttpKnowledgeBaseClient {
    async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> AppResult<Vec<RetrievedChunk>> {
        let url = self.connection.url(&[
            "knowledgebases",
            &self.config.knowledge_base_id,
            "retrieve",
        ])?;
        let body = Self::retrieve_body(query, options);
        tracing::debug!("Retrieve body: {}", body);

        let value = self.connection.post_json(url, &body).await?;
        let response: RetrieveResponse = serde_json::from_value(value)
            .map_err(|e| AppError::Service(format!("Failed to parse retrieve response: {}", e)))?;

        Ok(response
            .retrieval_results
            .into_iter()
            .map(RetrievedChunk::from)
            .collect())
    }

    async fn retrieve_and_generate(
        &self,
        query: &str,
        options: &GenerateOptions,
    ) -> AppResult<RagAnswer> {
        let url = self.connection.url(&["retrieveAndGenerate"])?;
        let body = self.generate_body(query, options);
        tracing::debug!("RetrieveAndGenerate body: {}", body);

        let value = self.connection.post_json(url, &body).await?;
        let response: GenerateResponse = serde_json::from_value(value).map_err(|e| {
            AppError::Service(format!("Failed to parse retrieveAndGenerate response: {}", e))
        })?;

        Ok(convert_generate_response(query, response))
    }
}

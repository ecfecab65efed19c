//! RAG answering orchestration.
//!
//! Two ways to answer a question:
//! - managed: one retrieve-and-generate call to the knowledge base
//! - self-hosted: retrieve chunks, format a chat prompt, invoke an endpoint

use crate::client::KnowledgeBaseClient;
use crate::types::{GenerateOptions, GuardrailAction, RagAnswer, RetrieveOptions, RetrievedChunk};
use kbrag_core::AppResult;
use kbrag_llm::{LlmClient, LlmRequest};
use kbrag_prompt::format_rag_prompt_with_system;

/// Vector search for `query`.
pub async fn retrieve(
    client: &dyn KnowledgeBaseClient,
    query: &str,
    options: &RetrieveOptions,
) -> AppResult<Vec<RetrievedChunk>> {
    tracing::info!(
        "Retrieving chunks (top_k: {:?}, filtered: {})",
        options.top_k,
        options.filter.is_some()
    );

    let chunks = client.retrieve(query, options).await?;

    tracing::info!("Retrieved {} chunks", chunks.len());
    Ok(chunks)
}

/// Answer `query` with one managed retrieve-and-generate call.
pub async fn ask(
    client: &dyn KnowledgeBaseClient,
    query: &str,
    options: &GenerateOptions,
) -> AppResult<RagAnswer> {
    tracing::info!(
        "Retrieve-and-generate with model {} (filtered: {}, guardrail: {})",
        options.model_id,
        options.retrieval.filter.is_some(),
        options.guardrail.is_some()
    );

    let answer = client.retrieve_and_generate(query, options).await?;

    if answer.guardrail_action == GuardrailAction::Intervened {
        tracing::warn!("Guardrail intervened on the answer");
    }
    tracing::info!(
        "Answer generated with {} citations",
        answer.citations.len()
    );

    Ok(answer)
}

/// Endpoint generation settings.
#[derive(Debug, Clone, Default)]
pub struct EndpointParams {
    /// Override for the built-in system message
    pub system: Option<String>,
    pub max_new_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

/// Answer `query` with a self-hosted endpoint.
///
/// With a knowledge base client, retrieved chunks become the context;
/// without one, the question is asked with empty context.
pub async fn ask_endpoint(
    kb: Option<&dyn KnowledgeBaseClient>,
    llm: &dyn LlmClient,
    query: &str,
    retrieval: &RetrieveOptions,
    params: &EndpointParams,
) -> AppResult<RagAnswer> {
    let context = match kb {
        Some(kb) => retrieve(kb, query, retrieval).await?,
        None => Vec::new(),
    };

    let prompt =
        format_rag_prompt_with_system(query, &build_context(&context), params.system.as_deref())?;

    let mut request = LlmRequest::new(prompt, "");
    request.max_tokens = params.max_new_tokens;
    request.temperature = params.temperature;
    request.top_p = params.top_p;

    let response = llm.complete(&request).await?;

    Ok(RagAnswer {
        question: query.to_string(),
        answer: response.content.trim().to_string(),
        context,
        citations: Vec::new(),
        guardrail_action: GuardrailAction::None,
        session_id: None,
    })
}

/// Join chunks into a numbered context block.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Document {}]\n{}", i + 1, chunk.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}


#[cfg(test)]
mod tests {
    use super::fakes::{chunk, FakeKb, FakeLlm};
    use super::*;

    #[test]
    fn test_build_context() {
        let context = build_context(&[chunk("First chunk", "a"), chunk("Second chunk", "b")]);
        assert!(context.contains("[Document 1]\nFirst chunk"));
        assert!(context.contains("[Document 2]\nSecond chunk"));
        assert!(context.contains("---"));
    }

    #[tokio::test]
    async fn test_ask_passes_through() {
        let kb = FakeKb::default();
        let answer = ask(&kb, "q", &GenerateOptions::new("model-a")).await.unwrap();
        assert_eq!(answer.answer, "model-a says hi");
    }

    #[tokio::test]
    async fn test_ask_endpoint_with_kb_context() {
        let kb = FakeKb {
            chunks: vec![chunk("Paris is the capital of France.", "s3://b/fr.txt")],
            ..Default::default()
        };
        let llm = FakeLlm::new("  Paris.  ");

        let answer = ask_endpoint(
            Some(&kb),
            &llm,
            "Capital of France?",
            &RetrieveOptions::default().with_top_k(2),
            &EndpointParams {
                max_new_tokens: Some(64),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(answer.answer, "Paris.");
        assert_eq!(answer.context.len(), 1);

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].prompt.starts_with("<s>[INST] <<SYS>>"));
        assert!(prompts[0].prompt.contains("Paris is the capital of France."));
        assert_eq!(prompts[0].max_tokens, Some(64));
    }

    #[tokio::test]
    async fn test_ask_endpoint_custom_system() {
        let llm = FakeLlm::new("ok");
        ask_endpoint(
            None,
            &llm,
            "Hi?",
            &RetrieveOptions::default(),
            &EndpointParams {
                system: Some("Answer in French.".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].prompt.contains("<<SYS>>\nAnswer in French.\n<</SYS>>"));
    }

    #[tokio::test]
    async fn test_retrieval_failure_aborts() {
        let kb = FakeKb {
            fail: true,
            ..Default::default()
        };
        let llm = FakeLlm::new("never");
        let result = ask_endpoint(
            Some(&kb),
            &llm,
            "q",
            &RetrieveOptions::default(),
            &EndpointParams::default(),
        )
        .await;

        assert!(result.is_err());
        assert!(llm.prompts.lock().unwrap().is_empty());
    }
}

//! Query decomposition.
//!
//! A compound question ("How did revenue change and who is the CFO?") mixes
//! topics and retrieves poorly. The model splits it into standalone
//! sub-questions, each is retrieved separately, and the merged chunks feed
//! one final answer.

use crate::client::KnowledgeBaseClient;
use crate::rag::ask::{build_context, retrieve};
use crate::types::{RetrieveOptions, RetrievedChunk};
use kbrag_core::AppResult;
use kbrag_llm::{LlmClient, LlmRequest};
use kbrag_prompt::{build_prompt, load_prompt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Result of answering through decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposedAnswer {
    pub question: String,
    pub sub_questions: Vec<String>,
    pub context: Vec<RetrievedChunk>,
    pub answer: String,
}

/// Ask `model` to split `query` into sub-questions.
///
/// Falls back to the original query when the reply holds no question.
pub async fn decompose_query(
    workspace: &Path,
    llm: &dyn LlmClient,
    model: &str,
    query: &str,
) -> AppResult<Vec<String>> {
    let def = load_prompt(workspace, "decompose")?;
    let mut variables = HashMap::new();
    variables.insert("query".to_string(), query.to_string());
    let built = build_prompt(&def, variables)?;

    let mut request = LlmRequest::new(built.user, model).with_temperature(0.0);
    if let Some(system) = built.system {
        request = request.with_system(system);
    }

    let response = llm.complete(&request).await?;
    let sub_questions = parse_sub_questions(&response.content);

    if sub_questions.is_empty() {
        tracing::warn!("Decomposition returned no sub-questions, using the original query");
        return Ok(vec![query.to_string()]);
    }

    tracing::info!("Decomposed query into {} sub-questions", sub_questions.len());
    for (i, q) in sub_questions.iter().enumerate() {
        tracing::debug!("Sub-question {}: {}", i + 1, q);
    }

    Ok(sub_questions)
}

/// Parse a model reply into sub-questions.
///
/// Accepts a JSON array of strings anywhere in the reply, otherwise one
/// question per line with list markers stripped.
pub fn parse_sub_questions(reply: &str) -> Vec<String> {
    if let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) {
        if start < end {
            if let Ok(items) = serde_json::from_str::<Vec<String>>(&reply[start..=end]) {
                return items
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }
    }

    reply
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .unwrap_or(line);

    // "1." / "12)" numbering
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }

    line
}

/// Decompose, retrieve per sub-question, and answer over the merged context.
pub async fn answer_decomposed(
    workspace: &Path,
    kb: &dyn KnowledgeBaseClient,
    llm: &dyn LlmClient,
    model: &str,
    query: &str,
    retrieval: &RetrieveOptions,
) -> AppResult<DecomposedAnswer> {
    let sub_questions = decompose_query(workspace, llm, model, query).await?;

    let mut context: Vec<RetrievedChunk> = Vec::new();
    for sub_question in &sub_questions {
        for chunk in retrieve(kb, sub_question, retrieval).await? {
            let duplicate = context
                .iter()
                .any(|c| c.location == chunk.location && c.text == chunk.text);
            if !duplicate {
                context.push(chunk);
            }
        }
    }

    tracing::info!(
        "Merged {} unique chunks across {} sub-questions",
        context.len(),
        sub_questions.len()
    );

    let def = load_prompt(workspace, "rag.answer")?;
    let mut variables = HashMap::new();
    variables.insert("query".to_string(), query.to_string());
    variables.insert("context".to_string(), build_context(&context));
    let built = build_prompt(&def, variables)?;

    let mut request = LlmRequest::new(built.user, model);
    if let Some(system) = built.system {
        request = request.with_system(system);
    }
    let response = llm.complete(&request).await?;

    Ok(DecomposedAnswer {
        question: query.to_string(),
        sub_questions,
        context,
        answer: response.content.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::ask::fakes::{chunk, FakeKb, FakeLlm};
    use tempfile::TempDir;

    #[test]
    fn test_parse_json_array() {
        let reply = "Here you go:\n[\"What was Q3 revenue?\", \"Who is the CFO?\"]";
        assert_eq!(
            parse_sub_questions(reply),
            vec!["What was Q3 revenue?", "Who is the CFO?"]
        );
    }

    #[test]
    fn test_parse_numbered_lines() {
        let reply = "1. What was Q3 revenue?\n2) Who is the CFO?\n\n- Where is HQ?";
        assert_eq!(
            parse_sub_questions(reply),
            vec!["What was Q3 revenue?", "Who is the CFO?", "Where is HQ?"]
        );
    }

    #[test]
    fn test_parse_keeps_numbers_inside_text() {
        assert_eq!(parse_sub_questions("2023 revenue?"), vec!["2023 revenue?"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_sub_questions("  \n ").is_empty());
        assert!(parse_sub_questions("[]").is_empty());
    }

    #[tokio::test]
    async fn test_empty_decomposition_falls_back() {
        let workspace = TempDir::new().unwrap();
        let llm = FakeLlm::new("[]");

        let subs = decompose_query(workspace.path(), &llm, "m", "Original?")
            .await
            .unwrap();
        assert_eq!(subs, vec!["Original?"]);
    }

    #[tokio::test]
    async fn test_answer_decomposed_merges_context() {
        let workspace = TempDir::new().unwrap();
        let kb = FakeKb {
            chunks: vec![chunk("Shared fact.", "s3://b/a.txt")],
            ..Default::default()
        };
        let llm = FakeLlm::new("[\"A?\", \"B?\"]");

        let result = answer_decomposed(
            workspace.path(),
            &kb,
            &llm,
            "m",
            "A and B?",
            &RetrieveOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.sub_questions, vec!["A?", "B?"]);
        assert_eq!(*kb.queries.lock().unwrap(), vec!["A?", "B?"]);
        // Same chunk from both sub-questions is kept once
        assert_eq!(result.context.len(), 1);

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].prompt.contains("Shared fact."));
        assert!(prompts[1].prompt.contains("A and B?"));
    }
}

//! Answer grading.

use crate::types::Correctness;
use async_trait::async_trait;
use kbrag_core::{AppError, AppResult};
use kbrag_llm::{LlmClient, LlmRequest};
use kbrag_prompt::{build_prompt, load_prompt, PromptDefinition};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Classifies one answer against its ground truth.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn classify(
        &self,
        question: &str,
        answer: &str,
        ground_truth: &str,
    ) -> AppResult<Correctness>;
}

/// Judge backed by a model and the `judge` prompt.
pub struct LlmJudge {
    llm: Arc<dyn LlmClient>,
    model: String,
    definition: PromptDefinition,
}

impl LlmJudge {
    /// Resolves the `judge` prompt from the workspace, falling back to the
    /// built-in one.
    pub fn new(workspace: &Path, llm: Arc<dyn LlmClient>, model: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            llm,
            model: model.into(),
            definition: load_prompt(workspace, "judge")?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn classify(
        &self,
        question: &str,
        answer: &str,
        ground_truth: &str,
    ) -> AppResult<Correctness> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("answer".to_string(), answer.to_string());
        variables.insert("ground_truth".to_string(), ground_truth.to_string());
        let built = build_prompt(&self.definition, variables)?;

        let mut request = LlmRequest::new(built.user, self.model.as_str())
            .with_temperature(0.0)
            .with_max_tokens(16);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self.llm.complete(&request).await?;
        parse_verdict(&response.content)
    }
}

/// First verdict word in a judge reply, case-insensitive.
///
/// "NOT CORRECT" reads as Incorrect. A negated MISSING or INCORRECT names
/// no category and is rejected.
pub fn parse_verdict(reply: &str) -> AppResult<Correctness> {
    let mut negated = false;

    for word in reply.split(|c: char| !c.is_ascii_alphabetic()).filter(|w| !w.is_empty()) {
        let word = word.to_ascii_uppercase();
        let verdict = match word.as_str() {
            "CORRECT" => Correctness::Correct,
            "MISSING" => Correctness::Missing,
            "INCORRECT" => Correctness::Incorrect,
            _ => {
                negated = word == "NOT";
                continue;
            }
        };

        return match (negated, verdict) {
            (false, verdict) => Ok(verdict),
            (true, Correctness::Correct) => Ok(Correctness::Incorrect),
            (true, _) => Err(AppError::Evaluation(format!(
                "Judge reply negates a verdict ambiguously: {}",
                excerpt(reply)
            ))),
        };
    }

    Err(AppError::Evaluation(format!(
        "Judge reply has no verdict: {}",
        excerpt(reply)
    )))
}

fn excerpt(reply: &str) -> String {
    reply.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbrag_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ScriptedLlm {
        reply: String,
        prompts: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.prompts.lock().unwrap().push(request.clone());
            Ok(LlmResponse {
                content: self.reply.clone(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
                latency_ms: None,
            })
        }
    }

    #[test]
    fn test_parse_verdict() {
        assert_eq!(parse_verdict("CORRECT").unwrap(), Correctness::Correct);
        assert_eq!(parse_verdict("incorrect.").unwrap(), Correctness::Incorrect);
        assert_eq!(
            parse_verdict("Verdict: MISSING\nThe answer declines.").unwrap(),
            Correctness::Missing
        );
    }

    #[test]
    fn test_negated_correct_is_incorrect() {
        assert_eq!(parse_verdict("NOT CORRECT").unwrap(), Correctness::Incorrect);
        assert_eq!(
            parse_verdict("The answer is not correct.").unwrap(),
            Correctness::Incorrect
        );
        // Negation only binds to the next word
        assert_eq!(
            parse_verdict("Not much to add: CORRECT").unwrap(),
            Correctness::Correct
        );
    }

    #[test]
    fn test_negated_other_verdicts_rejected() {
        for reply in ["NOT MISSING", "not incorrect"] {
            match parse_verdict(reply) {
                Err(AppError::Evaluation(msg)) => assert!(msg.contains("ambiguously")),
                other => panic!("expected evaluation error for {:?}, got {:?}", reply, other),
            }
        }
    }

    #[test]
    fn test_parse_verdict_unrecognized() {
        let err = parse_verdict("I think it is fine").unwrap_err();
        assert!(matches!(err, AppError::Evaluation(_)));
    }

    #[tokio::test]
    async fn test_llm_judge_renders_prompt() {
        let workspace = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm {
            reply: "Incorrect".to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        let judge = LlmJudge::new(workspace.path(), llm.clone(), "judge-model").unwrap();

        let verdict = judge
            .classify("Capital of France?", "Lyon", "Paris")
            .await
            .unwrap();
        assert_eq!(verdict, Correctness::Incorrect);

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts[0].model, "judge-model");
        assert!(prompts[0].prompt.contains("Capital of France?"));
        assert!(prompts[0].prompt.contains("Lyon"));
        assert!(prompts[0].prompt.contains("Paris"));
    }
}

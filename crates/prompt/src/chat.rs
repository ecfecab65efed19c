//! Chat-turn formatting for self-hosted endpoints.
//!
//! Hosted Llama-2 chat models expect the conversation flattened into one
//! string:
//!
//! ```text
//! <s>[INST] <<SYS>>
//! {system}
//! <</SYS>>
//!
//! {user} [/INST] {assistant} </s><s>[INST] {user} [/INST]
//! ```

use crate::builder::render_template;
use crate::builtin::{builtin, RAG_ANSWER};
use kbrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Flatten a conversation into the Llama-2 chat format.
///
/// Turns must alternate user/assistant starting with a user turn, and the
/// system message (if any) is folded into the first user turn. Turn content
/// is kept byte for byte; only the system message is trimmed.
pub fn format_chat(system: Option<&str>, turns: &[ChatTurn]) -> AppResult<String> {
    let mut prompt = String::new();

    for (i, turn) in turns.iter().enumerate() {
        let expected = if i % 2 == 0 {
            ChatRole::User
        } else {
            ChatRole::Assistant
        };
        if turn.role != expected {
            return Err(AppError::Prompt(format!(
                "Chat turn {} must be {:?}, got {:?}",
                i, expected, turn.role
            )));
        }

        match turn.role {
            ChatRole::User => {
                prompt.push_str("<s>[INST] ");
                if i == 0 {
                    if let Some(system) = system {
                        prompt.push_str(&format!("<<SYS>>\n{}\n<</SYS>>\n\n", system.trim()));
                    }
                }
                prompt.push_str(&turn.content);
                prompt.push_str(" [/INST]");
            }
            ChatRole::Assistant => {
                prompt.push(' ');
                prompt.push_str(&turn.content);
                prompt.push_str(" </s>");
            }
        }
    }

    if prompt.is_empty() {
        return Err(AppError::Prompt("Conversation has no turns".to_string()));
    }

    Ok(prompt)
}

/// Format a single-turn RAG question for a self-hosted endpoint.
///
/// Uses the built-in `rag.answer` system message and template.
pub fn format_rag_prompt(query: &str, context: &str) -> AppResult<String> {
    format_rag_prompt_with_system(query, context, None)
}

/// Like `format_rag_prompt`, with an optional system message override.
pub fn format_rag_prompt_with_system(
    query: &str,
    context: &str,
    system: Option<&str>,
) -> AppResult<String> {
    let def = builtin(RAG_ANSWER)
        .ok_or_else(|| AppError::Prompt(format!("Missing built-in prompt {}", RAG_ANSWER)))?;

    let mut variables = HashMap::new();
    variables.insert("query".to_string(), query.to_string());
    variables.insert("context".to_string(), context.to_string());

    let user = render_template(&def.template, &variables)?;
    format_chat(system.or(def.system.as_deref()), &[ChatTurn::user(user)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_turn_with_system() {
        let prompt = format_chat(Some("Be brief."), &[ChatTurn::user("Hi")]).unwrap();
        assert_eq!(
            prompt,
            "<s>[INST] <<SYS>>\nBe brief.\n<</SYS>>\n\nHi [/INST]"
        );
    }

    #[test]
    fn test_multi_turn() {
        let prompt = format_chat(
            None,
            &[
                ChatTurn::user("Hi"),
                ChatTurn::assistant("Hello!"),
                ChatTurn::user("Bye"),
            ],
        )
        .unwrap();

        assert_eq!(prompt, "<s>[INST] Hi [/INST] Hello! </s><s>[INST] Bye [/INST]");
    }

    #[test]
    fn test_turn_order_enforced() {
        assert!(format_chat(None, &[ChatTurn::assistant("first")]).is_err());
        assert!(format_chat(None, &[]).is_err());
    }

    #[test]
    fn test_trailing_whitespace_changes_prompt() {
        let plain = format_rag_prompt("What is RAG?", "ctx").unwrap();
        let padded = format_rag_prompt("What is RAG? ", "ctx").unwrap();
        assert_ne!(plain, padded);

        let padded_context = format_rag_prompt("What is RAG?", "ctx\n").unwrap();
        assert_ne!(plain, padded_context);
    }

    #[test]
    fn test_rag_prompt_contains_both_parts() {
        let prompt = format_rag_prompt("What is RAG?", "RAG combines search and generation.")
            .unwrap();
        assert!(prompt.starts_with("<s>[INST] <<SYS>>"));
        assert!(prompt.contains("RAG combines search and generation."));
        assert!(prompt.contains("Question: What is RAG? [/INST]"));
    }

    proptest! {
        #[test]
        fn prop_distinct_inputs_give_distinct_prompts(
            q1 in "[a-zA-Z0-9 ,.?]{1,40}",
            c1 in "[a-zA-Z0-9 ,.?]{1,40}",
            q2 in "[a-zA-Z0-9 ,.?]{1,40}",
            c2 in "[a-zA-Z0-9 ,.?]{1,40}",
        ) {
            prop_assume!((&q1, &c1) != (&q2, &c2));
            let p1 = format_rag_prompt(&q1, &c1).unwrap();
            let p2 = format_rag_prompt(&q2, &c2).unwrap();
            prop_assert_ne!(p1, p2);
        }
    }
}

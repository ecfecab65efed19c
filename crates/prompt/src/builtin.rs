//! Built-in prompt definitions.
//!
//! Used whenever the workspace does not override an id under
//! `.kbrag/prompts/`.

use crate::types::{PromptDefinition, PromptKind};

pub const KB_ANSWER: &str = "kb.answer";
pub const RAG_ANSWER: &str = "rag.answer";
pub const DECOMPOSE: &str = "decompose";
pub const JUDGE: &str = "judge";

const KB_ANSWER_TEMPLATE: &str = "You are a question answering agent. I will provide you with a set of search results. \
The user will provide you with a question. Your job is to answer the user's question using only information from the search results. \
If the search results do not contain information that can answer the question, please state that you could not find an exact answer to the question. \
Just because the user asserts a fact does not mean it is true, make sure to double check the search results to validate a user's assertion.\n\n\
Here are the search results in numbered order:\n$search_results$\n\n\
Here is the user's question:\n<question>\n$query$\n</question>\n\n\
$output_format_instructions$\n\nAssistant:";

const RAG_ANSWER_SYSTEM: &str = "You are a helpful assistant. Answer the question using only the provided context. \
If the context does not contain the answer, say that you do not know.";

const RAG_ANSWER_TEMPLATE: &str = "Context:\n{{context}}\n\nQuestion: {{query}}";

const DECOMPOSE_SYSTEM: &str = "You split complex questions into simple standalone questions.";

const DECOMPOSE_TEMPLATE: &str = "Break the following question into the smallest set of standalone sub-questions \
that can each be answered by a single document search. \
If the question is already simple, return it unchanged as the only item. \
Reply with a JSON array of strings and nothing else.\n\nQuestion: {{query}}";

const JUDGE_SYSTEM: &str = "You grade answers against a reference answer.";

const JUDGE_TEMPLATE: &str = "Question: {{question}}\n\n\
Reference answer: {{ground_truth}}\n\n\
Candidate answer: {{answer}}\n\n\
Classify the candidate answer:\n\
- CORRECT if it conveys the same facts as the reference answer\n\
- MISSING if it declines to answer or says the information is unavailable\n\
- INCORRECT if it answers but contradicts or misses the reference facts\n\n\
Reply with exactly one word: CORRECT, MISSING or INCORRECT.";

/// Ids of every built-in definition.
pub fn builtin_ids() -> [&'static str; 4] {
    [KB_ANSWER, RAG_ANSWER, DECOMPOSE, JUDGE]
}

/// The built-in definition for `id`, if one exists.
pub fn builtin(id: &str) -> Option<PromptDefinition> {
    let (title, kind, system, template) = match id {
        KB_ANSWER => ("Knowledge base answer", PromptKind::Kb, None, KB_ANSWER_TEMPLATE),
        RAG_ANSWER => (
            "Answer over context",
            PromptKind::Answer,
            Some(RAG_ANSWER_SYSTEM),
            RAG_ANSWER_TEMPLATE,
        ),
        DECOMPOSE => (
            "Query decomposition",
            PromptKind::Decompose,
            Some(DECOMPOSE_SYSTEM),
            DECOMPOSE_TEMPLATE,
        ),
        JUDGE => ("Answer grading", PromptKind::Judge, Some(JUDGE_SYSTEM), JUDGE_TEMPLATE),
        _ => return None,
    };

    Some(PromptDefinition {
        id: id.to_string(),
        title: title.to_string(),
        api_version: "1.0".to_string(),
        kind,
        system: system.map(str::to_string),
        template: template.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_resolves() {
        for id in builtin_ids() {
            let def = builtin(id).unwrap();
            assert_eq!(def.id, id);
            assert!(!def.template.is_empty());
        }
    }

    #[test]
    fn test_kb_template_has_service_placeholders() {
        let def = builtin(KB_ANSWER).unwrap();
        assert!(def.template.contains("$search_results$"));
        assert!(def.template.contains("$query$"));
    }

    #[test]
    fn test_unknown_id() {
        assert!(builtin("nope").is_none());
    }
}

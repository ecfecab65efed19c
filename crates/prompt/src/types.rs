//! Prompt types for kbrag.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a prompt is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Sent verbatim to the knowledge base service, which fills
    /// `$search_results$` and `$query$` itself
    Kb,
    /// Answer a question over supplied context
    Answer,
    /// Split a compound question into sub-questions
    Decompose,
    /// Grade an answer against ground truth
    Judge,
}

/// A prompt definition loaded from YAML or taken from the built-ins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    pub kind: PromptKind,

    /// System message template (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax
    pub template: String,
}

/// A fully built prompt ready for model execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                resolved_variables,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: team.answer
title: Team Answer
apiVersion: "1.0"
kind: answer
system: "You answer for the support team."
template: "{{context}}\n\n{{query}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "team.answer");
        assert_eq!(def.kind, PromptKind::Answer);
        assert!(def.system.is_some());
    }

    #[test]
    fn test_system_is_optional() {
        let yaml = r#"
id: kb.custom
title: Custom KB
apiVersion: "1.0"
kind: kb
template: "$search_results$ $query$"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.kind, PromptKind::Kb);
        assert!(def.system.is_none());
    }
}

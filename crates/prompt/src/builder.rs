//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use kbrag_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the system and user templates are rendered with Handlebars. Missing
/// variables render as empty strings. Knowledge base placeholders such as
/// `$search_results$` pass through untouched.
///
/// # Example
/// ```no_run
/// use kbrag_prompt::{build_prompt, load_prompt};
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), "rag.answer")?;
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "What is a guardrail?".to_string());
/// vars.insert("context".to_string(), "A guardrail filters output.".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|s| render_template(s, &variables))
        .transpose()?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{builtin, KB_ANSWER, RAG_ANSWER};
    use crate::types::PromptKind;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let result = render_template("Question: {{query}}", &vars(&[("query", "Hello & <bye>")]));
        assert_eq!(result.unwrap(), "Question: Hello & <bye>");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let result = render_template("Question: {{missing}}", &HashMap::new());
        assert_eq!(result.unwrap(), "Question: ");
    }

    #[test]
    fn test_render_template_syntax_error() {
        let result = render_template("{{#if}}", &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_build_rag_answer() {
        let def = builtin(RAG_ANSWER).unwrap();
        let built = build_prompt(
            &def,
            vars(&[("query", "Who won?"), ("context", "Team A won the cup.")]),
        )
        .unwrap();

        assert!(built.user.contains("Team A won the cup."));
        assert!(built.user.ends_with("Question: Who won?"));
        assert!(built.system.is_some());
        assert_eq!(built.metadata.source_prompt_id, RAG_ANSWER);
    }

    #[test]
    fn test_kb_placeholders_survive_rendering() {
        let def = builtin(KB_ANSWER).unwrap();
        assert_eq!(def.kind, PromptKind::Kb);

        let built = build_prompt(&def, HashMap::new()).unwrap();
        assert_eq!(built.user, def.template);
    }
}

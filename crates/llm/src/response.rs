//! Self-hosted endpoint response shapes.
//!
//! Hosted text-generation containers answer in one of three shapes. Each
//! shape is a variant here; anything else lands in `Unrecognized`.

use kbrag_core::{AppError, AppResult};
use serde_json::Value;

/// A classified endpoint response body.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointOutput {
    /// `{"generated_text": "..."}`
    GeneratedText(String),

    /// `[{"generated_text": "..."}, ...]`, first element wins
    GeneratedTextList(String),

    /// `{"generation": "..."}`
    Generation(String),

    /// Any other body
    Unrecognized(Value),
}

impl EndpointOutput {
    /// Classify a decoded response body.
    pub fn classify(body: Value) -> Self {
        let text_field = |value: &Value, field: &str| -> Option<String> {
            value.get(field).and_then(Value::as_str).map(str::to_string)
        };

        match &body {
            Value::Array(items) => match items.first().and_then(|v| text_field(v, "generated_text")) {
                Some(text) => Self::GeneratedTextList(text),
                None => Self::Unrecognized(body),
            },
            Value::Object(_) => {
                if let Some(text) = text_field(&body, "generated_text") {
                    Self::GeneratedText(text)
                } else if let Some(text) = text_field(&body, "generation") {
                    Self::Generation(text)
                } else {
                    Self::Unrecognized(body)
                }
            }
            _ => Self::Unrecognized(body),
        }
    }

    /// The generated text, or an error for an unrecognized body.
    pub fn into_text(self) -> AppResult<String> {
        match self {
            Self::GeneratedText(text) | Self::GeneratedTextList(text) | Self::Generation(text) => {
                Ok(text)
            }
            Self::Unrecognized(body) => Err(AppError::ResponseShape(truncate(&body.to_string()))),
        }
    }
}

/// Extract generated text from an endpoint response body.
pub fn resolve_generated_text(body: Value) -> AppResult<String> {
    EndpointOutput::classify(body).into_text()
}

fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_field() {
        assert_eq!(resolve_generated_text(json!({"generation": "X"})).unwrap(), "X");
    }

    #[test]
    fn test_generated_text_list() {
        assert_eq!(
            resolve_generated_text(json!([{"generated_text": "Y"}, {"generated_text": "ignored"}]))
                .unwrap(),
            "Y"
        );
    }

    #[test]
    fn test_generated_text_top_level() {
        assert_eq!(
            EndpointOutput::classify(json!({"generated_text": "Z", "details": {}})),
            EndpointOutput::GeneratedText("Z".to_string())
        );
    }

    #[test]
    fn test_empty_object_is_error() {
        let err = resolve_generated_text(json!({})).unwrap_err();
        assert!(matches!(err, AppError::ResponseShape(_)));
    }

    #[test]
    fn test_other_shapes_unrecognized() {
        assert!(matches!(
            EndpointOutput::classify(json!([])),
            EndpointOutput::Unrecognized(_)
        ));
        assert!(matches!(
            EndpointOutput::classify(json!([{"text": "nope"}])),
            EndpointOutput::Unrecognized(_)
        ));
        assert!(matches!(
            EndpointOutput::classify(json!({"generation": 5})),
            EndpointOutput::Unrecognized(_)
        ));
        assert!(resolve_generated_text(json!("plain string")).is_err());
    }

    #[test]
    fn test_long_body_truncated_in_error() {
        let body = json!({"unexpected": "a".repeat(1000)});
        let msg = resolve_generated_text(body).unwrap_err().to_string();
        assert!(msg.len() < 300);
        assert!(msg.ends_with("..."));
    }
}

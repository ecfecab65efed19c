//! User-facing source references.

use crate::types::{RagAnswer, RetrievedChunk};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum snippet length for source references.
const MAX_SNIPPET_LENGTH: usize = 150;

/// A single source reference used to answer a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSourceRef {
    /// Document name (last path segment of the URI)
    pub source: String,

    /// Full URI, or the source type when no URI exists
    pub location: String,

    /// Short snippet of the supporting chunk
    pub snippet: String,
}

impl RagSourceRef {
    pub fn from_chunk(chunk: &RetrievedChunk) -> Self {
        let location = chunk
            .location
            .uri
            .clone()
            .unwrap_or_else(|| chunk.location.kind.clone());

        let source = location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string();

        Self {
            source,
            location,
            snippet: truncate_snippet(&chunk.text, MAX_SNIPPET_LENGTH),
        }
    }
}

/// Map an answer's supporting chunks to de-duplicated source references.
pub fn sources_for(answer: &RagAnswer) -> Vec<RagSourceRef> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for chunk in &answer.context {
        let source_ref = RagSourceRef::from_chunk(chunk);
        if seen.insert((source_ref.location.clone(), source_ref.snippet.clone())) {
            sources.push(source_ref);
        }
    }

    sources
}

/// Truncate at a word boundary, appending "..." when cut.
pub(crate) fn truncate_snippet(text: &str, max_len: usize) -> String {
    let text = text.trim();
    let cut = match text.char_indices().nth(max_len) {
        Some((idx, _)) => idx,
        None => return text.to_string(),
    };

    let truncated = &text[..cut];
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkLocation, GuardrailAction};

    fn chunk(text: &str, uri: Option<&str>) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            location: ChunkLocation {
                kind: "S3".to_string(),
                uri: uri.map(str::to_string),
            },
            score: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_source_name_from_uri() {
        let source_ref = RagSourceRef::from_chunk(&chunk("x", Some("s3://bucket/reports/q3.pdf")));
        assert_eq!(source_ref.source, "q3.pdf");
        assert_eq!(source_ref.location, "s3://bucket/reports/q3.pdf");
    }

    #[test]
    fn test_source_without_uri() {
        let source_ref = RagSourceRef::from_chunk(&chunk("x", None));
        assert_eq!(source_ref.source, "S3");
    }

    #[test]
    fn test_sources_deduplicated() {
        let answer = RagAnswer {
            question: "q".to_string(),
            answer: "a".to_string(),
            context: vec![
                chunk("same", Some("s3://b/a.pdf")),
                chunk("same", Some("s3://b/a.pdf")),
                chunk("other", Some("s3://b/a.pdf")),
            ],
            citations: Vec::new(),
            guardrail_action: GuardrailAction::None,
            session_id: None,
        };
        assert_eq!(sources_for(&answer).len(), 2);
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("Short text", 100), "Short text");

        let long = "This is a very long text that needs to be truncated at some point";
        let result = truncate_snippet(long, 30);
        assert!(result.len() <= 33);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "é".repeat(20);
        assert_eq!(truncate_snippet(&text, 5), format!("{}...", "é".repeat(5)));
    }
}

//! Command handlers for the kbrag CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod decompose;
pub mod endpoint;
pub mod evaluate;
pub mod prompts;
pub mod retrieve;
pub mod sweep;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use decompose::DecomposeCommand;
pub use endpoint::EndpointCommand;
pub use evaluate::EvaluateCommand;
pub use prompts::PromptsCommand;
pub use retrieve::RetrieveCommand;
pub use sweep::SweepCommand;

use kbrag_core::{AppError, AppResult};
use kbrag_knowledge::{optional_equality_filter, parse_filter_arg, RetrievalFilter, RetrieveOptions};
use kbrag_llm::ProviderType;
use serde::Serialize;

/// Build retrieval options from `--filter k=v` and `--top-k` flags.
pub(crate) fn retrieve_options(filters: &[String], top_k: Option<u32>) -> AppResult<RetrieveOptions> {
    let mut options = RetrieveOptions::default().with_filter(parse_filters(filters)?);
    if let Some(top_k) = top_k {
        options = options.with_top_k(top_k);
    }
    Ok(options)
}

fn parse_filters(filters: &[String]) -> AppResult<Option<RetrievalFilter>> {
    let pairs = filters
        .iter()
        .map(|f| parse_filter_arg(f))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(optional_equality_filter(pairs))
}

/// Resolve a `--provider` name.
pub(crate) fn parse_provider(name: &str) -> AppResult<ProviderType> {
    ProviderType::parse(name).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown provider '{}' (expected bedrock or endpoint)",
            name
        ))
    })
}

/// Pretty-print `value` as JSON to stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieve_options_from_flags() {
        let options =
            retrieve_options(&["company=ACME".to_string(), "year=2023".to_string()], Some(4))
                .unwrap();
        assert_eq!(options.top_k, Some(4));
        assert_eq!(options.filter.unwrap().clause_count(), 2);
    }

    #[test]
    fn test_no_filters() {
        let options = retrieve_options(&[], None).unwrap();
        assert!(options.filter.is_none());
        assert!(options.top_k.is_none());
    }

    #[test]
    fn test_bad_filter_rejected() {
        assert!(retrieve_options(&["no-equals-sign".to_string()], None).is_err());
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(parse_provider("bedrock").unwrap(), ProviderType::Bedrock);
        assert_eq!(parse_provider("SageMaker").unwrap(), ProviderType::Endpoint);
        assert_eq!(parse_provider("endpoint").unwrap(), ProviderType::Endpoint);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        match parse_provider("ollama") {
            Err(AppError::Config(msg)) => assert!(msg.contains("'ollama'")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}

//! Metadata filters for vector search.
//!
//! Filters are only ever evaluated by the knowledge base service. This module
//! builds the expression tree and serializes it in the service's grammar:
//!
//! ```json
//! {"andAll": [{"equals": {"key": "genre", "value": "jazz"}}, ...]}
//! ```

use kbrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `(key, value)` comparison against a document metadata attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub key: String,
    pub value: Value,
}

/// Boolean expression over metadata attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RetrievalFilter {
    Equals(FilterClause),
    NotEquals(FilterClause),
    GreaterThan(FilterClause),
    GreaterThanOrEquals(FilterClause),
    LessThan(FilterClause),
    LessThanOrEquals(FilterClause),
    In(FilterClause),
    NotIn(FilterClause),
    StartsWith(FilterClause),
    StringContains(FilterClause),
    ListContains(FilterClause),
    AndAll(Vec<RetrievalFilter>),
    OrAll(Vec<RetrievalFilter>),
}

impl RetrievalFilter {
    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals(FilterClause {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn and_all(filters: Vec<RetrievalFilter>) -> Self {
        Self::AndAll(filters)
    }

    pub fn or_all(filters: Vec<RetrievalFilter>) -> Self {
        Self::OrAll(filters)
    }

    /// Number of leaf clauses in the tree.
    pub fn clause_count(&self) -> usize {
        match self {
            Self::AndAll(children) | Self::OrAll(children) => {
                children.iter().map(Self::clause_count).sum()
            }
            _ => 1,
        }
    }
}

/// AND together one equality clause per pair, in input order.
///
/// Keys are not checked against the index; an unknown key simply matches
/// nothing.
pub fn build_equality_filter<I, K, V>(pairs: I) -> RetrievalFilter
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    RetrievalFilter::and_all(
        pairs
            .into_iter()
            .map(|(key, value)| RetrievalFilter::equals(key, value))
            .collect(),
    )
}

/// Like `build_equality_filter`, but `None` when there are no pairs.
pub fn optional_equality_filter(pairs: Vec<(String, Value)>) -> Option<RetrievalFilter> {
    if pairs.is_empty() {
        None
    } else {
        Some(build_equality_filter(pairs))
    }
}

/// Parse a `key=value` command-line argument.
///
/// Numbers and booleans are sent typed; everything else is a string.
pub fn parse_filter_arg(arg: &str) -> AppResult<(String, Value)> {
    let (key, raw) = arg.split_once('=').ok_or_else(|| {
        AppError::Config(format!("Filter '{}' must have the form key=value", arg))
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::Config(format!("Filter '{}' has an empty key", arg)));
    }

    let value = match serde_json::from_str::<Value>(raw.trim()) {
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
        _ => Value::String(raw.to_string()),
    };

    Ok((key.to_string(), value))
}

//! Error types for kbrag.
//!
//! One enum covers every failure category: configuration, calls to the
//! managed services, endpoint response shapes, prompts and evaluation.

use thiserror::Error;

/// Unified error type for kbrag.
///
/// Every operation returns `Result<T, AppError>`. Nothing is retried; the
/// error aborts the operation that raised it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing config file, missing key, malformed config
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport or service-side failure from a managed service
    #[error("Service error: {0}")]
    Service(String),

    /// A model endpoint answered with a body we cannot read text from
    #[error("Unrecognized response shape: {0}")]
    ResponseShape(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Judge and ground-truth errors
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

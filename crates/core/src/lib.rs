//! kbrag Core Library
//!
//! This crate provides the foundational utilities shared by every kbrag crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Process settings (`AppConfig`) and service identifiers (`RagConfig`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, RagConfig};
pub use error::{AppError, AppResult};

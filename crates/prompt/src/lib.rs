//! Prompt system for kbrag.
//!
//! This crate provides:
//! - YAML prompt definitions with built-in defaults
//! - Handlebars template rendering
//! - Chat-turn formatting for self-hosted endpoints

pub mod builder;
pub mod builtin;
pub mod chat;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use chat::{
    format_chat, format_rag_prompt, format_rag_prompt_with_system, ChatRole, ChatTurn,
};
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptKind};

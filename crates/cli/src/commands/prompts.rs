//! Prompts command handler.

use clap::Args;
use kbrag_core::{config::AppConfig, AppResult};
use kbrag_prompt::{builtin::builtin_ids, list_prompts};

/// List available prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let workspace = list_prompts(&config.workspace)?;
        let builtin: Vec<&str> = builtin_ids()
            .into_iter()
            .filter(|id| !workspace.iter().any(|w| w.as_str() == *id))
            .collect();

        if self.json {
            return super::print_json(&serde_json::json!({
                "workspace": workspace,
                "builtin": builtin,
            }));
        }

        for id in &workspace {
            println!("{} (workspace)", id);
        }
        for id in &builtin {
            println!("{} (built-in)", id);
        }

        Ok(())
    }
}

//! JSON result files.

use kbrag_core::AppResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Write `value` as indented JSON, creating parent directories.
///
/// Non-ASCII text is written as-is, not escaped.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    std::fs::write(path, content)?;

    tracing::info!("Wrote {:?}", path);
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

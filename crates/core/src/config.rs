//! Configuration management for kbrag.
//!
//! Two layers of configuration exist:
//! - `AppConfig`: process settings (workspace, log level, colors) merged from
//!   defaults, environment variables and command-line flags
//! - `RagConfig`: externally provisioned service identifiers (knowledge base,
//!   account, region, endpoint, guardrail) read from a JSON file
//!
//! `RagConfig` is loaded once and passed by reference to every operation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Name of the service identifier file looked up in the workspace.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Environment variable holding the bearer token, unless overridden.
pub const DEFAULT_API_KEY_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Prefixes that mark a cross-region inference profile id.
const INFERENCE_PROFILE_PREFIXES: [&str; 4] = ["us.", "eu.", "apac.", "global."];

/// Process-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root (holds config.json and .kbrag/)
    pub workspace: PathBuf,

    /// Explicit path to the service identifier file
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load process settings from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `KBRAG_WORKSPACE`: Override workspace path
    /// - `KBRAG_CONFIG`: Path to the service identifier file
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("KBRAG_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("KBRAG_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Apply CLI overrides, giving flags precedence over the environment.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .kbrag directory.
    pub fn kbrag_dir(&self) -> PathBuf {
        self.workspace.join(".kbrag")
    }

    /// Path of the service identifier file in effect.
    pub fn rag_config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.workspace.join(DEFAULT_CONFIG_FILE))
    }

    /// Load the service identifiers this process runs against.
    pub fn load_rag_config(&self) -> AppResult<RagConfig> {
        RagConfig::from_file(&self.rag_config_path())
    }
}

/// Externally provisioned service identifiers.
///
/// Required keys fail at load time; optional keys fail when an operation
/// that needs them asks for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(alias = "kb_id")]
    pub knowledge_base_id: String,

    pub account_number: String,

    #[serde(alias = "region")]
    pub region_name: String,

    /// Self-hosted inference endpoint name
    #[serde(default)]
    pub endpoint_name: Option<String>,

    #[serde(default)]
    pub guardrail_id: Option<String>,

    #[serde(default)]
    pub guardrail_version: Option<String>,

    /// JSON file of `{question, ground_truth}` records
    #[serde(default)]
    pub ground_truth_data_path: Option<PathBuf>,

    /// Generation model used when a command names none
    #[serde(default)]
    pub default_model_id: Option<String>,

    /// Model used as correctness judge
    #[serde(default)]
    pub judge_model_id: Option<String>,

    /// Override for the knowledge base runtime base URL
    #[serde(default)]
    pub agent_runtime_url: Option<String>,

    /// Override for the model runtime base URL
    #[serde(default)]
    pub bedrock_runtime_url: Option<String>,

    /// Override for the self-hosted endpoint runtime base URL
    #[serde(default)]
    pub sagemaker_runtime_url: Option<String>,

    /// Name of the environment variable holding the bearer token
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Guardrail reference attached to generation requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailRef {
    pub id: String,
    pub version: String,
}

impl RagConfig {
    /// Read and parse a JSON identifier file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config = Self::from_json(&contents)
            .map_err(|e| AppError::Config(format!("{} ({:?})", e, path)))?;

        tracing::debug!(
            "Loaded config for knowledge base {} in {}",
            config.knowledge_base_id,
            config.region_name
        );

        Ok(config)
    }

    /// Parse identifiers from a JSON string.
    pub fn from_json(contents: &str) -> AppResult<Self> {
        serde_json::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Endpoint name, or a configuration error when the key is absent.
    pub fn require_endpoint_name(&self) -> AppResult<&str> {
        self.endpoint_name
            .as_deref()
            .ok_or_else(|| missing_key("endpoint_name"))
    }

    /// Ground-truth file path, or a configuration error when absent.
    pub fn require_ground_truth_path(&self) -> AppResult<&Path> {
        self.ground_truth_data_path
            .as_deref()
            .ok_or_else(|| missing_key("ground_truth_data_path"))
    }

    /// Generation model, preferring an explicit choice over the configured default.
    pub fn resolve_model_id(&self, explicit: Option<&str>) -> AppResult<String> {
        explicit
            .or(self.default_model_id.as_deref())
            .map(str::to_string)
            .ok_or_else(|| missing_key("default_model_id"))
    }

    /// The configured guardrail. Both id and version must be present.
    pub fn require_guardrail(&self) -> AppResult<GuardrailRef> {
        let id = self
            .guardrail_id
            .clone()
            .ok_or_else(|| missing_key("guardrail_id"))?;
        let version = self
            .guardrail_version
            .clone()
            .ok_or_else(|| missing_key("guardrail_version"))?;
        Ok(GuardrailRef { id, version })
    }

    /// Base URL of the knowledge base runtime.
    pub fn agent_runtime_url(&self) -> String {
        self.agent_runtime_url.clone().unwrap_or_else(|| {
            format!("https://bedrock-agent-runtime.{}.amazonaws.com", self.region_name)
        })
    }

    /// Base URL of the managed model runtime.
    pub fn bedrock_runtime_url(&self) -> String {
        self.bedrock_runtime_url
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region_name))
    }

    /// Base URL of the self-hosted endpoint runtime.
    pub fn sagemaker_runtime_url(&self) -> String {
        self.sagemaker_runtime_url
            .clone()
            .unwrap_or_else(|| format!("https://runtime.sagemaker.{}.amazonaws.com", self.region_name))
    }

    /// Bearer token from the configured environment variable, if set.
    pub fn bearer_token(&self) -> Option<String> {
        let var = self.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
        std::env::var(var).ok().filter(|v| !v.is_empty())
    }

    /// HTTP timeout applied to every service call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(60))
    }

    /// Expand a model id into the ARN the knowledge base service expects.
    ///
    /// ARNs pass through unchanged. Inference profile ids (`us.`, `eu.`, ...)
    /// are account-scoped; everything else is a foundation model.
    pub fn model_arn(&self, model_id: &str) -> String {
        if model_id.starts_with("arn:") {
            return model_id.to_string();
        }

        if INFERENCE_PROFILE_PREFIXES
            .iter()
            .any(|prefix| model_id.starts_with(prefix))
        {
            format!(
                "arn:aws:bedrock:{}:{}:inference-profile/{}",
                self.region_name, self.account_number, model_id
            )
        } else {
            format!(
                "arn:aws:bedrock:{}::foundation-model/{}",
                self.region_name, model_id
            )
        }
    }
}

fn missing_key(key: &str) -> AppError {
    AppError::Config(format!("Missing required config key: {}", key))
}

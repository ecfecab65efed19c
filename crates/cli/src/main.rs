//! kbrag CLI
//!
//! Main entry point for the kbrag command-line tool.
//! Queries a managed knowledge base, compares generation models on a
//! question set, and grades their answers against ground truth.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, DecomposeCommand, EndpointCommand, EvaluateCommand, PromptsCommand,
    RetrieveCommand, SweepCommand,
};
use kbrag_core::{
    config::AppConfig,
    logging::{self, LogFormat},
    AppError, AppResult,
};
use std::path::PathBuf;

/// kbrag - retrieval-augmented generation over managed knowledge bases
#[derive(Parser, Debug)]
#[command(name = "kbrag")]
#[command(about = "Retrieval-augmented generation over managed knowledge bases", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "KBRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to the service identifier file (default: <workspace>/config.json)
    #[arg(short, long, global = true, env = "KBRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log output format (pretty, json)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Retrieve matching chunks from the knowledge base
    Retrieve(RetrieveCommand),

    /// Answer a question with managed retrieve-and-generate
    Ask(AskCommand),

    /// Split a compound question, retrieve per part, then answer
    Decompose(DecomposeCommand),

    /// Answer a question with a self-hosted inference endpoint
    Endpoint(EndpointCommand),

    /// Answer a question set with several models
    Sweep(SweepCommand),

    /// Grade sweep results against ground truth
    Evaluate(EvaluateCommand),

    /// List available prompt definitions
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    let log_format = LogFormat::parse(&cli.log_format).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown log format '{}' (expected pretty or json)",
            cli.log_format
        ))
    })?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color, log_format)?;

    tracing::info!("kbrag starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Service config: {:?}", config.rag_config_path());

    let command_name = match &cli.command {
        Commands::Retrieve(_) => "retrieve",
        Commands::Ask(_) => "ask",
        Commands::Decompose(_) => "decompose",
        Commands::Endpoint(_) => "endpoint",
        Commands::Sweep(_) => "sweep",
        Commands::Evaluate(_) => "evaluate",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Decompose(cmd) => cmd.execute(&config).await,
        Commands::Endpoint(cmd) => cmd.execute(&config).await,
        Commands::Sweep(cmd) => cmd.execute(&config).await,
        Commands::Evaluate(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

//! Ragscope CLI
//!
//! Main entry point for the ragscope command-line tool.
//! Each subcommand is a run-to-completion batch job over the review dataset.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, EvalQualityCommand, EvalRetrievalCommand, IngestCommand, RetrieveCommand,
    StatsCommand,
};
use ragscope_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Ragscope - retrieval and answer-quality evaluation over customer reviews
#[derive(Parser, Debug)]
#[command(name = "ragscope")]
#[command(about = "Retrieval and answer-quality evaluation over customer reviews", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RAGSCOPE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RAGSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Review dataset (CSV with a header row)
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Embed the dataset into the vector store
    Ingest(IngestCommand),

    /// Show the reviews most similar to a query
    Retrieve(RetrieveCommand),

    /// Answer a question from retrieved reviews and log the session
    Ask(AskCommand),

    /// Report vector health: similarity spread and recall proxy
    Stats(StatsCommand),

    /// Score retrieval similarity for the configured topic queries
    EvalRetrieval(EvalRetrievalCommand),

    /// Score logged answers for relevance, faithfulness and sentiment alignment
    EvalQuality(EvalQualityCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration from file and environment
    let config = AppConfig::load(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(cli.dataset, cli.log_level, cli.verbose, cli.no_color);

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Ragscope CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: {}/{} ({}d)",
        config.embedding.provider,
        config.embedding.model,
        config.embedding.dimensions
    );

    config.validate()?;
    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Retrieve(_) => "retrieve",
        Commands::Ask(_) => "ask",
        Commands::Stats(_) => "stats",
        Commands::EvalRetrieval(_) => "eval-retrieval",
        Commands::EvalQuality(_) => "eval-quality",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::EvalRetrieval(cmd) => cmd.execute(&config).await,
        Commands::EvalQuality(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

mod compression;
mod config;
mod diagnostics;
mod errors;
mod evaluation;
mod llm_client;
mod models;
mod shortlist;
mod state;
mod table_client;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::shortlist::criteria::ShortlistCriteria;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "applicant-sync", version, about = "Batch jobs over the applicant tracking base")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Join the satellite tables into each applicant's Compressed JSON
    Compress,
    /// Recreate satellite records from each applicant's Compressed JSON
    Decompress,
    /// Apply the shortlist rules and create leads for qualifying applicants
    Shortlist,
    /// Write LLM summary, score, and follow-ups for unevaluated applicants
    Evaluate,
    /// Check credentials and table store connectivity
    Check,
    /// Compress, then shortlist, then evaluate
    RunAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=info", env!("CARGO_CRATE_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Starting applicant-sync v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Check => run_check().await,
        command => run_job(command).await,
    }
}

async fn run_job(command: Command) -> Result<()> {
    let state = AppState::from_config(Config::from_env()?)?;
    let store = state.store.as_ref();
    let criteria = ShortlistCriteria::default();

    match command {
        Command::Compress => {
            compression::compress::compress_all(store).await?;
        }
        Command::Decompress => {
            compression::decompress::decompress_all(store).await?;
        }
        Command::Shortlist => {
            shortlist::automation::evaluate_all(store, &criteria).await?;
        }
        Command::Evaluate => {
            let llm = state.completion_service()?;
            evaluation::evaluator::evaluate_all(store, llm.as_ref()).await?;
        }
        Command::RunAll => {
            // Build the LLM client first so a missing key fails before any writes.
            let llm = state.completion_service()?;
            compression::compress::compress_all(store).await?;
            shortlist::automation::evaluate_all(store, &criteria).await?;
            evaluation::evaluator::evaluate_all(store, llm.as_ref()).await?;
        }
        Command::Check => run_check().await?,
    }

    Ok(())
}

async fn run_check() -> Result<()> {
    info!("Testing environment setup...");
    let statuses = diagnostics::credential_status(|key| std::env::var(key).ok());
    if !diagnostics::report_credentials(&statuses) {
        anyhow::bail!("Missing required environment variables");
    }

    let state = AppState::from_config(Config::from_env()?)?;
    diagnostics::check_table_store(state.store.as_ref()).await?;
    Ok(())
}

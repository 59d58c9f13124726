//! `pipeline-pulse` CLI entry-point.
//!
//! Available sub-commands:
//! - `ingest`      — fetch workflow runs from GitHub and upsert them into Postgres.
//! - `init-schema` — create the `pipeline_runs` table and indexes.
//! - `normalize`   — normalize a saved API response offline and print the rows.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use github::WorkflowRunsPage;
use pipeline::config::with_overrides;
use pipeline::{BatchReport, PipelineConfig};

/// Exit code when the batch ended without anything to process.
const EXIT_NO_WORK: u8 = 3;

#[derive(Parser)]
#[command(
    name = "pipeline-pulse",
    about = "Ingest GitHub Actions workflow runs into Postgres",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch workflow runs and upsert them into `pipeline_runs`.
    Ingest {
        /// `owner/repo`; overrides GITHUB_REPOSITORY.
        #[arg(long)]
        repository: Option<String>,
        /// GitHub API root; overrides GITHUB_API_URL.
        #[arg(long)]
        api_url: Option<String>,
        /// DDL script; overrides PIPELINE_SCHEMA_PATH.
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Create the `pipeline_runs` table and indexes if they do not exist.
    InitSchema {
        /// DDL script; overrides PIPELINE_SCHEMA_PATH.
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Normalize a saved "list workflow runs" response without touching
    /// the network or the database.
    Normalize {
        /// Path to the JSON response file.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ingest { repository, api_url, schema } => {
            ingest(repository, api_url, schema).await
        }
        Command::InitSchema { schema } => init_schema(schema).await,
        Command::Normalize { path } => normalize_file(&path).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn ingest(
    repository: Option<String>,
    api_url: Option<String>,
    schema: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let env = |key: &str| std::env::var(key).ok();
    let mut config = PipelineConfig::from_lookup(with_overrides(
        env,
        vec![("GITHUB_REPOSITORY", repository), ("GITHUB_API_URL", api_url)],
    ))?;
    if let Some(schema) = schema {
        config.schema_path = schema;
    }
    info!("Starting ingestion with {config:?}");

    let report = pipeline::run(&config).await?;
    match &report {
        BatchReport::Completed(summary) => {
            println!("Finished processing runs for {}. {summary}", config.repository);
        }
        BatchReport::NoWork(reason) => {
            println!("No workflow runs processed for {}: {reason}", config.repository);
        }
    }
    info!("Script finished.");
    Ok(ExitCode::from(exit_status(&report)))
}

/// `0` once every fetched run went through the sink, whatever the per-run
/// outcomes; [`EXIT_NO_WORK`] when nothing was processed.
fn exit_status(report: &BatchReport) -> u8 {
    match report {
        BatchReport::Completed(_) => 0,
        BatchReport::NoWork(_) => EXIT_NO_WORK,
    }
}

async fn init_schema(schema: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let env = |key: &str| std::env::var(key).ok();
    let params = pipeline::config::connect_params_from_lookup(&env)?;
    let schema = schema.unwrap_or_else(|| pipeline::config::schema_path_from_lookup(&env));

    let mut conn = db::connection::connect(&params).await?;
    let result = db::schema::ensure_schema(&mut conn, &schema).await;
    db::connection::close(conn).await;
    result?;

    println!("Schema applied from {}", schema.display());
    Ok(ExitCode::SUCCESS)
}

fn normalize_file(path: &std::path::Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    let page: WorkflowRunsPage =
        serde_json::from_str(&content).context("invalid workflow runs JSON")?;

    let runs = page.workflow_runs.unwrap_or_default();
    let rows: Vec<_> = runs.iter().map(pipeline::normalize).collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

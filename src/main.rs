use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use reel_ratings::config::{IngestConfig, DEFAULT_CONFIG_PATH};
use reel_ratings::database_ops::db::Db;
use reel_ratings::orchestrator::run_pipeline;
use reel_ratings::tracing::{init_tracing, DEFAULT_FILTER};
use reel_ratings::util::env as env_util;
use tracing::{error, info};

/// Ingest the movie, critic and user review CSVs, then print the reports.
#[derive(Debug, Parser)]
#[command(name = "reel-ratings", version)]
struct Args {
    /// JSON file naming the three CSV inputs.
    #[arg(long, env = "REEL_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

async fn run(args: Args) -> Result<()> {
    let cfg = IngestConfig::load(&args.config)?;
    cfg.log_snapshot();

    let db = Db::connect(&cfg.database_url, cfg.max_connections)
        .await
        .context("Db::connect failed")?;
    info!("database connected (max_conns={})", cfg.max_connections);

    let outcome = run_pipeline(&db, &cfg).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("serialize run outcome")?
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    env_util::init_env();
    if let Err(err) = init_tracing(DEFAULT_FILTER) {
        eprintln!("{err}");
    }
    env_util::bootstrap_cli("reel-ratings");

    let args = Args::parse();
    // Failures are reported here and not re-raised; the process exits normally.
    if let Err(err) = run(args).await {
        error!("run failed: {err:#}");
    }
}

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::IngestConfig;
use crate::database_ops::db::Db;
use crate::orchestrator::run_reports;

/// Print the three reports for an already ingested store.
pub async fn run(config_path: &Path) -> Result<()> {
    let cfg = IngestConfig::load(config_path)?;
    cfg.log_snapshot();
    let db = Db::connect(&cfg.database_url, cfg.max_connections).await?;
    let reports = run_reports(&db, &cfg.report_movie_title).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&reports).context("serialize reports")?
    );
    Ok(())
}

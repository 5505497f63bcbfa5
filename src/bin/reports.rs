use std::path::PathBuf;

use anyhow::Result;
use reel_ratings::config::DEFAULT_CONFIG_PATH;
use reel_ratings::tracing::{init_tracing, DEFAULT_FILTER};
use reel_ratings::util::env;

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing(DEFAULT_FILTER)?;
    env::bootstrap_cli("reports");
    let path = std::env::args()
        .nth(1)
        .or_else(|| env::env_opt("REEL_CONFIG"))
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    reel_ratings::cli::reports::run(&PathBuf::from(path)).await
}

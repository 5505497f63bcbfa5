use anyhow::Result;
use reel_ratings::cli::db_counts::{run, DbCountsConfig};

#[tokio::main]
async fn main() -> Result<()> {
    reel_ratings::util::env::init_env();
    reel_ratings::tracing::init_tracing("warn")?;
    reel_ratings::util::env::bootstrap_cli("db_counts");

    run(DbCountsConfig {
        database_url: std::env::args().nth(1),
    })
    .await
}

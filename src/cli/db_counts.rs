use std::fmt::Write as _;

use anyhow::Result;
use sqlx::Row;

use crate::database_ops::db::Db;
use crate::util::env as env_util;

#[derive(Debug, Clone, Default)]
pub struct DbCountsConfig {
    /// Optional override for the store connection string.
    pub database_url: Option<String>,
}

pub async fn run(cfg: DbCountsConfig) -> Result<()> {
    env_util::init_env();
    let db_url = cfg
        .database_url
        .or_else(env_util::db_url)
        .unwrap_or_else(|| env_util::DEFAULT_DATABASE_URL.to_string());
    let db = Db::connect(&db_url, 1).await?;
    let out = render(&db, &env_util::redact_url(&db_url)).await?;
    println!("{}", out);
    Ok(())
}

/// Text summary of the store: per-collection counts plus critic verdict split.
pub async fn render(db: &Db, label: &str) -> Result<String> {
    let counts = db.collection_counts().await?;
    let mut out = String::new();
    writeln!(out, "store: {label}").ok();
    writeln!(out, "  movies:  {}", counts.movies).ok();
    writeln!(out, "  critics: {}", counts.critics).ok();
    writeln!(out, "  users:   {}", counts.users).ok();

    let states = sqlx::query(
        "SELECT review_state, COUNT(*) AS n FROM critics GROUP BY review_state ORDER BY review_state",
    )
    .fetch_all(&db.pool)
    .await?;
    for row in states {
        let state: String = row.get("review_state");
        let n: i64 = row.get("n");
        writeln!(out, "    {state}: {n}").ok();
    }

    let unreviewed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM movies m
         WHERE NOT EXISTS (SELECT 1 FROM critics c WHERE c.movie_ref = m.id)",
    )
    .fetch_one(&db.pool)
    .await?;
    writeln!(out, "  movies without critic reviews: {unreviewed}").ok();
    Ok(out)
}

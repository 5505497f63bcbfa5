use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

use super::models::Movie;

/// Handle to the document store. Cloning shares the same pool.
#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

/// Collection DDL, applied idempotently on connect.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS movies (
        id             TEXT PRIMARY KEY NOT NULL,
        movie_id       TEXT NOT NULL UNIQUE,
        movie_title    TEXT NOT NULL UNIQUE,
        movie_year     INTEGER NOT NULL,
        movie_url      TEXT NOT NULL UNIQUE,
        movie_rank     INTEGER NOT NULL,
        critic_score   TEXT NOT NULL,
        audience_score TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS critics (
        id               TEXT PRIMARY KEY NOT NULL,
        review_id        TEXT NOT NULL UNIQUE,
        movie_ref        TEXT REFERENCES movies(id),
        creation_date    TEXT NOT NULL,
        critic_name      TEXT,
        critic_page_url  TEXT,
        review_state     TEXT NOT NULL CHECK (review_state IN ('fresh', 'rotten')),
        is_fresh         INTEGER NOT NULL,
        is_rotten        INTEGER NOT NULL,
        is_rt_url        INTEGER NOT NULL,
        is_top_critic    INTEGER NOT NULL,
        publication_url  TEXT NOT NULL,
        publication_name TEXT NOT NULL,
        review_url       TEXT,
        score_sentiment  TEXT NOT NULL CHECK (score_sentiment IN ('POSITIVE', 'NEGATIVE')),
        original_score   TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS critics_movie_ref_idx ON critics (movie_ref)",
    "CREATE TABLE IF NOT EXISTS users (
        id                TEXT PRIMARY KEY NOT NULL,
        movie_ref         TEXT REFERENCES movies(id),
        rating            REAL NOT NULL,
        review_id         TEXT,
        is_verified       INTEGER NOT NULL,
        is_super_reviewer INTEGER NOT NULL,
        has_spoilers      INTEGER NOT NULL,
        has_profanity     INTEGER NOT NULL,
        score             REAL NOT NULL,
        creation_date     TEXT NOT NULL,
        user_display_name TEXT,
        user_realm        TEXT NOT NULL,
        user_id           TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS users_movie_ref_idx ON users (movie_ref)",
];

/// Per-collection document counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub movies: i64,
    pub critics: i64,
    pub users: i64,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans (they may contain credentials).
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)
            .context("invalid database URL")?
            .create_if_missing(true)
            .foreign_keys(true);

        // Idle connections are never reaped so an in-memory store survives the run.
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .context("failed to connect to document store")?;
        info!(max_connections, "connected to db");

        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        for ddl in SCHEMA {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .with_context(|| format!("schema statement failed: {ddl}"))?;
        }
        Ok(())
    }

    /// Bulk-clear all three collections ahead of a fresh ingestion run.
    pub async fn clear_all(&self) -> Result<CollectionCounts> {
        let users = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await?
            .rows_affected();
        let critics = sqlx::query("DELETE FROM critics")
            .execute(&self.pool)
            .await?
            .rows_affected();
        let movies = sqlx::query("DELETE FROM movies")
            .execute(&self.pool)
            .await?
            .rows_affected();
        let cleared = CollectionCounts {
            movies: movies as i64,
            critics: critics as i64,
            users: users as i64,
        };
        info!(?cleared, "cleared collections");
        Ok(cleared)
    }

    pub async fn collection_counts(&self) -> Result<CollectionCounts> {
        Ok(CollectionCounts {
            movies: self.count("movies").await?,
            critics: self.count("critics").await?,
            users: self.count("users").await?,
        })
    }

    async fn count(&self, collection: &str) -> Result<i64> {
        let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {collection}"))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("count {collection}"))?;
        Ok(n)
    }

    /// Resolve a natural `movieId` to the movie's generated identifier.
    pub async fn find_movie_ref(&self, movie_id: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM movies WHERE movie_id = ?")
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>, sqlx::Error> {
        sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE movie_title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await
    }
}

#[cfg(test)]
pub(crate) async fn memory_db() -> Db {
    Db::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory store should open")
}

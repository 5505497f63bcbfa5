//! Fixed read-only reports over the ingested collections.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::FromRow;

use super::db::Db;

/// One bucket of a critic-score histogram.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct RatingFrequency {
    pub rating: f64,
    pub frequency: i64,
}

/// Highest-scoring critic review across all movies.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCriticReview {
    pub highest_rating: f64,
    pub review_id: String,
    pub critic_name: Option<String>,
    pub movie_title: String,
}

/// Movie with the highest average user rating.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestRatedMovie {
    /// Generated identifier of the movie document.
    pub movie_ref: String,
    pub movie_id: String,
    pub movie_title: String,
    pub average_rating: f64,
}

/// Critic-score histogram for the movie titled `movie_title`, ascending by score.
/// `None` when no such movie exists.
pub async fn rating_histogram(db: &Db, movie_title: &str) -> Result<Option<Vec<RatingFrequency>>> {
    let Some(movie) = db
        .find_movie_by_title(movie_title)
        .await
        .context("look up report movie")?
    else {
        return Ok(None);
    };
    let rows = sqlx::query_as::<_, RatingFrequency>(
        "SELECT CAST(original_score AS REAL) AS rating, COUNT(*) AS frequency
         FROM critics
         WHERE movie_ref = ?
         GROUP BY CAST(original_score AS REAL)
         ORDER BY rating ASC",
    )
    .bind(&movie.id)
    .fetch_all(&db.pool)
    .await
    .context("rating histogram query")?;
    Ok(Some(rows))
}

/// Best review per movie first, then the best of those. Ties go to the earliest stored review.
pub async fn top_critic_review(db: &Db) -> Result<Option<TopCriticReview>> {
    sqlx::query_as::<_, TopCriticReview>(
        "WITH ranked AS (
             SELECT CAST(c.original_score AS REAL) AS highest_rating,
                    c.review_id,
                    c.critic_name,
                    m.movie_title,
                    c.rowid AS seq,
                    ROW_NUMBER() OVER (
                        PARTITION BY c.movie_ref
                        ORDER BY CAST(c.original_score AS REAL) DESC, c.rowid ASC
                    ) AS rank_in_movie
             FROM critics c
             JOIN movies m ON m.id = c.movie_ref
         )
         SELECT highest_rating, review_id, critic_name, movie_title
         FROM ranked
         WHERE rank_in_movie = 1
         ORDER BY highest_rating DESC, seq ASC
         LIMIT 1",
    )
    .fetch_optional(&db.pool)
    .await
    .context("top critic review query")
}

pub async fn highest_rated_movie(db: &Db) -> Result<Option<HighestRatedMovie>> {
    sqlx::query_as::<_, HighestRatedMovie>(
        "SELECT m.id AS movie_ref,
                m.movie_id,
                m.movie_title,
                AVG(CAST(u.rating AS REAL)) AS average_rating
         FROM users u
         JOIN movies m ON m.id = u.movie_ref
         GROUP BY m.id
         ORDER BY average_rating DESC, MIN(u.rowid) ASC
         LIMIT 1",
    )
    .fetch_optional(&db.pool)
    .await
    .context("highest rated movie query")
}

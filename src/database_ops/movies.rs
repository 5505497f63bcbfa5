use serde::Deserialize;
use uuid::Uuid;

use super::db::Db;
use super::ingest::{parse_int, required, RowError, RowIngestor, RowOutcome};
use super::models::NewMovie;

/// Raw `movies.csv` record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieRow {
    #[serde(rename = "movieId", default)]
    pub movie_id: Option<String>,
    #[serde(rename = "movieTitle", default)]
    pub movie_title: Option<String>,
    #[serde(rename = "movieYear", default)]
    pub movie_year: Option<String>,
    #[serde(rename = "movieURL", default)]
    pub movie_url: Option<String>,
    #[serde(rename = "movieRank", default)]
    pub movie_rank: Option<String>,
    #[serde(default)]
    pub critic_score: Option<String>,
    #[serde(default)]
    pub audience_score: Option<String>,
}

impl TryFrom<MovieRow> for NewMovie {
    type Error = RowError;

    fn try_from(row: MovieRow) -> Result<Self, Self::Error> {
        Ok(NewMovie {
            movie_id: required(row.movie_id, "movieId")?,
            movie_title: required(row.movie_title, "movieTitle")?,
            movie_year: parse_int(row.movie_year, "movieYear")?,
            movie_url: required(row.movie_url, "movieURL")?,
            movie_rank: parse_int(row.movie_rank, "movieRank")?,
            critic_score: required(row.critic_score, "critic_score")?,
            audience_score: required(row.audience_score, "audience_score")?,
        })
    }
}

/// Insert the movie, or overwrite the one with the same title.
/// Returns the generated identifier, which is kept across overwrites.
pub async fn upsert_movie(db: &Db, movie: &NewMovie) -> Result<String, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO movies (id, movie_id, movie_title, movie_year, movie_url, movie_rank,
                             critic_score, audience_score)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (movie_title) DO UPDATE SET
             movie_id = excluded.movie_id,
             movie_year = excluded.movie_year,
             movie_url = excluded.movie_url,
             movie_rank = excluded.movie_rank,
             critic_score = excluded.critic_score,
             audience_score = excluded.audience_score
         RETURNING id",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&movie.movie_id)
    .bind(&movie.movie_title)
    .bind(movie.movie_year)
    .bind(&movie.movie_url)
    .bind(movie.movie_rank)
    .bind(&movie.critic_score)
    .bind(&movie.audience_score)
    .fetch_one(&db.pool)
    .await
}

/// Upserts movies keyed by title, fields written verbatim.
pub struct MovieIngestor;

#[async_trait::async_trait]
impl RowIngestor for MovieIngestor {
    type Row = MovieRow;

    fn dataset(&self) -> &'static str {
        "movies"
    }

    fn row_key(&self, row: &MovieRow) -> String {
        row.movie_title.clone().unwrap_or_default()
    }

    async fn apply(&self, db: &Db, row: MovieRow) -> Result<RowOutcome, RowError> {
        let movie = NewMovie::try_from(row)?;
        upsert_movie(db, &movie).await?;
        Ok(RowOutcome::Written)
    }
}

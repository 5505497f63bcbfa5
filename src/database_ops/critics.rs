use serde::Deserialize;
use uuid::Uuid;

use super::db::Db;
use super::ingest::{optional, parse_date, parse_enum, required, RowError, RowIngestor, RowOutcome};
use super::models::NewCritic;
use crate::normalization::{coerce_flag, normalize_rating};

/// Raw `critics.csv` record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticRow {
    #[serde(default)]
    pub movie_id: Option<String>,
    #[serde(default)]
    pub review_id: Option<String>,
    #[serde(default)]
    pub score_sentiment: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub critic_name: Option<String>,
    #[serde(default)]
    pub critic_page_url: Option<String>,
    #[serde(default)]
    pub review_state: Option<String>,
    #[serde(default)]
    pub is_fresh: Option<String>,
    #[serde(default)]
    pub is_rotten: Option<String>,
    #[serde(default)]
    pub is_rt_url: Option<String>,
    #[serde(default)]
    pub is_top_critic: Option<String>,
    #[serde(default)]
    pub publication_url: Option<String>,
    #[serde(default)]
    pub publication_name: Option<String>,
    #[serde(default)]
    pub review_url: Option<String>,
    #[serde(default)]
    pub original_score: Option<String>,
}

impl CriticRow {
    /// Build the document for a movie already resolved to its generated id.
    pub fn into_critic(self, movie_ref: String) -> Result<NewCritic, RowError> {
        let original_score = normalize_rating(self.original_score.as_deref().unwrap_or(""))?;
        Ok(NewCritic {
            review_id: required(self.review_id, "reviewId")?,
            movie_ref,
            creation_date: parse_date(self.creation_date, "creationDate")?,
            critic_name: optional(self.critic_name),
            critic_page_url: optional(self.critic_page_url),
            review_state: parse_enum(self.review_state, "reviewState")?,
            is_fresh: coerce_flag(self.is_fresh.as_deref()),
            is_rotten: coerce_flag(self.is_rotten.as_deref()),
            is_rt_url: coerce_flag(self.is_rt_url.as_deref()),
            is_top_critic: coerce_flag(self.is_top_critic.as_deref()),
            publication_url: required(self.publication_url, "publicationUrl")?,
            publication_name: required(self.publication_name, "publicationName")?,
            review_url: optional(self.review_url),
            score_sentiment: parse_enum(self.score_sentiment, "scoreSentiment")?,
            original_score,
        })
    }
}

/// Insert the review, or overwrite the one with the same `reviewId`.
pub async fn upsert_critic(db: &Db, critic: &NewCritic) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO critics (id, review_id, movie_ref, creation_date, critic_name,
                              critic_page_url, review_state, is_fresh, is_rotten, is_rt_url,
                              is_top_critic, publication_url, publication_name, review_url,
                              score_sentiment, original_score)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (review_id) DO UPDATE SET
             movie_ref = excluded.movie_ref,
             creation_date = excluded.creation_date,
             critic_name = excluded.critic_name,
             critic_page_url = excluded.critic_page_url,
             review_state = excluded.review_state,
             is_fresh = excluded.is_fresh,
             is_rotten = excluded.is_rotten,
             is_rt_url = excluded.is_rt_url,
             is_top_critic = excluded.is_top_critic,
             publication_url = excluded.publication_url,
             publication_name = excluded.publication_name,
             review_url = excluded.review_url,
             score_sentiment = excluded.score_sentiment,
             original_score = excluded.original_score",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&critic.review_id)
    .bind(&critic.movie_ref)
    .bind(critic.creation_date)
    .bind(&critic.critic_name)
    .bind(&critic.critic_page_url)
    .bind(critic.review_state.as_str())
    .bind(critic.is_fresh)
    .bind(critic.is_rotten)
    .bind(critic.is_rt_url)
    .bind(critic.is_top_critic)
    .bind(&critic.publication_url)
    .bind(&critic.publication_name)
    .bind(&critic.review_url)
    .bind(critic.score_sentiment.as_str())
    .bind(critic.original_score.encode())
    .execute(&db.pool)
    .await?;
    Ok(())
}

/// Resolves the referenced movie, normalizes flags and score, upserts by `reviewId`.
pub struct CriticIngestor;

#[async_trait::async_trait]
impl RowIngestor for CriticIngestor {
    type Row = CriticRow;

    fn dataset(&self) -> &'static str {
        "critics"
    }

    fn row_key(&self, row: &CriticRow) -> String {
        format!(
            "reviewId={} movieId={}",
            row.review_id.as_deref().unwrap_or(""),
            row.movie_id.as_deref().unwrap_or("")
        )
    }

    async fn apply(&self, db: &Db, mut row: CriticRow) -> Result<RowOutcome, RowError> {
        let movie_id = required(row.movie_id.take(), "movieId")?;
        let movie_ref = db
            .find_movie_ref(&movie_id)
            .await?
            .ok_or(RowError::MovieNotFound(movie_id))?;
        let critic = row.into_critic(movie_ref)?;
        upsert_critic(db, &critic).await?;
        Ok(RowOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::db::memory_db;
    use crate::database_ops::ingest::ingest_csv;
    use crate::database_ops::ingest::test_support::{csv_bytes, csv_file, MOVIES_HEADER};
    use crate::database_ops::models::{Critic, ReviewState, ScoreSentiment};
    use crate::database_ops::movies::MovieIngestor;

    const CRITICS_HEADER: &str = "movieId,reviewId,scoreSentiment,creationDate,criticName,\
        criticPageUrl,reviewState,isFresh,isRotten,isRtUrl,isTopCritic,publicationUrl,\
        publicationName,reviewUrl,originalScore\n";

    fn critic_line(movie_id: &str, review_id: &str, score: &str) -> String {
        format!(
            "{movie_id},{review_id},POSITIVE,2019-10-01,Ann Critic,/critics/ann,fresh,\
             True,False,,True,http://pub.example,Pub,http://pub.example/r,{score}\n"
        )
    }

    async fn seeded_db() -> Db {
        let db = memory_db().await;
        let movies = csv_file(&format!("{MOVIES_HEADER}m1,X,2000,u,1,90,80\n"));
        ingest_csv(&db, &MovieIngestor, movies.path()).await.unwrap();
        db
    }

    async fn fetch_critic(db: &Db, review_id: &str) -> Option<Critic> {
        sqlx::query_as::<_, Critic>("SELECT * FROM critics WHERE review_id = ?")
            .bind(review_id)
            .fetch_optional(&db.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn critic_rows_reference_the_ingested_movie() {
        let db = seeded_db().await;
        let critics = csv_file(&format!("{CRITICS_HEADER}{}", critic_line("m1", "r1", "B+")));

        let summary = ingest_csv(&db, &CriticIngestor, critics.path()).await.unwrap();
        assert_eq!(summary.written, 1);

        let critic = fetch_critic(&db, "r1").await.unwrap();
        assert_eq!(critic.original_score, "3.5");
        assert_eq!(critic.review_state, ReviewState::Fresh.as_str());
        assert_eq!(critic.score_sentiment, ScoreSentiment::Positive.as_str());
        assert!(critic.is_fresh);
        assert!(!critic.is_rotten);
        assert!(critic.is_rt_url, "blank flag defaults to true");
        assert!(critic.is_top_critic);

        let movie = db.find_movie_by_title("X").await.unwrap().unwrap();
        assert_eq!(critic.movie_ref.as_deref(), Some(movie.id.as_str()));
    }

    #[tokio::test]
    async fn unknown_movie_rows_are_skipped() {
        let db = seeded_db().await;
        let critics = csv_file(&format!(
            "{CRITICS_HEADER}{}{}",
            critic_line("missing", "r1", "4/5"),
            critic_line("m1", "r2", "4/5")
        ));

        let summary = ingest_csv(&db, &CriticIngestor, critics.path()).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.written, 1);
        assert!(fetch_critic(&db, "r1").await.is_none());
        assert_eq!(fetch_critic(&db, "r2").await.unwrap().original_score, "4.0");
    }

    #[tokio::test]
    async fn non_utf8_name_does_not_stop_later_rows() {
        let db = seeded_db().await;
        let mut contents = format!("{CRITICS_HEADER}m1,r1,POSITIVE,2019-10-01,Ren").into_bytes();
        contents.push(0xe9);
        contents.extend_from_slice(
            b",/critics/rene,fresh,True,False,True,False,http://p,P,http://p/r1,3/4\n",
        );
        contents.extend_from_slice(critic_line("m1", "r2", "4/5").as_bytes());
        let critics = csv_bytes(&contents);

        let summary = ingest_csv(&db, &CriticIngestor, critics.path()).await.unwrap();
        assert_eq!(summary.rows_read, 2);
        assert_eq!(summary.skipped, 0);
        let first = fetch_critic(&db, "r1").await.unwrap();
        assert_eq!(first.critic_name.as_deref(), Some("Ren\u{FFFD}"));
        assert_eq!(fetch_critic(&db, "r2").await.unwrap().original_score, "4.0");
    }

    #[tokio::test]
    async fn short_row_is_skipped_and_later_rows_written() {
        let db = seeded_db().await;
        let short = "m1,r1,POSITIVE,2019-10-01,Ann,/critics/ann,fresh,True,False,True,False,\
                     http://p,P,http://p/r1\n";
        let critics = csv_file(&format!(
            "{CRITICS_HEADER}{short}{}",
            critic_line("m1", "r2", "A")
        ));

        let summary = ingest_csv(&db, &CriticIngestor, critics.path()).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.written, 1);
        assert!(fetch_critic(&db, "r1").await.is_none());
        assert_eq!(fetch_critic(&db, "r2").await.unwrap().original_score, "4.5");
    }

    #[tokio::test]
    async fn same_review_id_keeps_the_last_row() {
        let db = seeded_db().await;
        let critics = csv_file(&format!(
            "{CRITICS_HEADER}{}{}",
            critic_line("m1", "r1", "A"),
            critic_line("m1", "r1", "2/10")
        ));

        ingest_csv(&db, &CriticIngestor, critics.path()).await.unwrap();
        assert_eq!(db.collection_counts().await.unwrap().critics, 1);
        assert_eq!(fetch_critic(&db, "r1").await.unwrap().original_score, "1.0");
    }

    #[tokio::test]
    async fn bad_enums_and_fractions_reject_the_row() {
        let db = seeded_db().await;
        let bad_state = critic_line("m1", "r1", "A").replace(",fresh,", ",Fresh,");
        let bad_sentiment = critic_line("m1", "r2", "A").replace("POSITIVE", "NEUTRAL");
        let critics = csv_file(&format!(
            "{CRITICS_HEADER}{bad_state}{bad_sentiment}{}{}",
            critic_line("m1", "r3", "3/0"),
            critic_line("m1", "r4", "Z")
        ));

        let summary = ingest_csv(&db, &CriticIngestor, critics.path()).await.unwrap();
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.written, 1);
        assert_eq!(fetch_critic(&db, "r4").await.unwrap().original_score, "0.0");
    }

    #[test]
    fn missing_score_normalizes_to_zero() {
        let row = CriticRow {
            review_id: Some("r9".into()),
            creation_date: Some("2020-02-02".into()),
            review_state: Some("rotten".into()),
            publication_url: Some("http://p".into()),
            publication_name: Some("P".into()),
            score_sentiment: Some("NEGATIVE".into()),
            ..Default::default()
        };
        let critic = row.into_critic("g1".into()).unwrap();
        assert_eq!(critic.original_score.value(), 0.0);
        assert_eq!(critic.review_state, ReviewState::Rotten);
        assert!(critic.is_fresh && critic.is_rotten && critic.is_rt_url && critic.is_top_critic);
        assert_eq!(critic.critic_name, None);
    }
}

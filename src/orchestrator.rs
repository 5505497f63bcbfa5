//! Stage sequencing: movies, then critics, then users, then reports.
//! Each stage runs to completion before the next one starts.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::database_ops::critics::CriticIngestor;
use crate::database_ops::db::Db;
use crate::database_ops::ingest::{ingest_csv, IngestSummary};
use crate::database_ops::movies::MovieIngestor;
use crate::database_ops::reports::{
    highest_rated_movie, rating_histogram, top_critic_review, HighestRatedMovie, RatingFrequency,
    TopCriticReview,
};
use crate::database_ops::users::UserIngestor;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reports {
    pub movie_title: String,
    pub rating_frequencies: Option<Vec<RatingFrequency>>,
    pub top_critic: Option<TopCriticReview>,
    pub highest_rated_movie: Option<HighestRatedMovie>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub ingest: Vec<IngestSummary>,
    pub reports: Reports,
}

/// Run the three ingestors in order. A stream-level failure stops the remaining stages.
pub async fn run_ingest(db: &Db, cfg: &IngestConfig) -> Result<Vec<IngestSummary>> {
    if cfg.clear_before_ingest {
        db.clear_all().await.context("clear collections")?;
    }
    let movies = ingest_csv(db, &MovieIngestor, &cfg.movie_data_path)
        .await
        .context("movie ingestion")?;
    let critics = ingest_csv(db, &CriticIngestor, &cfg.critic_review_data_path)
        .await
        .context("critic ingestion")?;
    let users = ingest_csv(
        db,
        &UserIngestor::new(cfg.user_write_mode),
        &cfg.user_review_data_path,
    )
    .await
    .context("user ingestion")?;
    Ok(vec![movies, critics, users])
}

pub async fn run_reports(db: &Db, movie_title: &str) -> Result<Reports> {
    let rating_frequencies = rating_histogram(db, movie_title).await?;
    match &rating_frequencies {
        Some(buckets) => info!(movie = movie_title, ?buckets, "rating frequencies"),
        None => warn!(movie = movie_title, "report movie not found; histogram skipped"),
    }

    let top_critic = top_critic_review(db).await?;
    info!(?top_critic, "top critic review");

    let highest_rated_movie = highest_rated_movie(db).await?;
    info!(?highest_rated_movie, "highest rated movie");

    Ok(Reports {
        movie_title: movie_title.to_string(),
        rating_frequencies,
        top_critic,
        highest_rated_movie,
    })
}

/// Full run: optional clear, ingestion (unless `skipIngest`), then reports.
pub async fn run_pipeline(db: &Db, cfg: &IngestConfig) -> Result<PipelineOutcome> {
    let ingest = if cfg.skip_ingest {
        info!("skipIngest set; using existing collections");
        Vec::new()
    } else {
        run_ingest(db, cfg).await?
    };
    let reports = run_reports(db, &cfg.report_movie_title).await?;
    Ok(PipelineOutcome { ingest, reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::db::memory_db;
    use crate::database_ops::ingest::test_support::{csv_file, MOVIES_HEADER};
    use crate::database_ops::users::UserWriteMode;
    use std::path::PathBuf;

    const CRITICS: &str = "movieId,reviewId,scoreSentiment,creationDate,criticName,criticPageUrl,\
        reviewState,isFresh,isRotten,isRtUrl,isTopCritic,publicationUrl,publicationName,reviewUrl,\
        originalScore\n\
        m1,r1,POSITIVE,2019-10-01,Ann,/c/ann,fresh,True,False,True,False,http://p,P,http://p/r1,B+\n\
        m9,r2,NEGATIVE,2019-10-02,Bob,/c/bob,rotten,False,True,True,False,http://p,P,http://p/r2,1/4\n";

    const USERS: &str = "movieId,rating,reviewId,isVerified,isSuperReviewer,hasSpoilers,\
        hasProfanity,score,creationDate,userDisplayName,userRealm,userId\n\
        m1,4.5,,True,False,False,False,4.5,2021-03-04,Sam,RT,u1\n\
        m1,3.5,,True,False,False,False,3.5,2021-03-05,Kim,RT,u2\n";

    fn config(movies: PathBuf, critics: PathBuf, users: PathBuf) -> IngestConfig {
        IngestConfig {
            movie_data_path: movies,
            critic_review_data_path: critics,
            user_review_data_path: users,
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
            clear_before_ingest: false,
            skip_ingest: false,
            report_movie_title: "X".into(),
            user_write_mode: UserWriteMode::Append,
        }
    }

    #[tokio::test]
    async fn end_to_end_ingest_and_reports() {
        let db = memory_db().await;
        let movies = csv_file(&format!("{MOVIES_HEADER}m1,X,2000,u,1,90,80\n"));
        let critics = csv_file(CRITICS);
        let users = csv_file(USERS);
        let cfg = config(
            movies.path().into(),
            critics.path().into(),
            users.path().into(),
        );

        let outcome = run_pipeline(&db, &cfg).await.unwrap();
        let written: Vec<u64> = outcome.ingest.iter().map(|s| s.written).collect();
        assert_eq!(written, vec![1, 1, 2]);
        assert_eq!(outcome.ingest[1].skipped, 1);

        let reports = outcome.reports;
        assert_eq!(
            reports.rating_frequencies,
            Some(vec![RatingFrequency { rating: 3.5, frequency: 1 }])
        );
        let top = reports.top_critic.unwrap();
        assert_eq!(top.highest_rating, 3.5);
        assert_eq!(top.movie_title, "X");
        let best = reports.highest_rated_movie.unwrap();
        assert_eq!(best.movie_id, "m1");
        assert_eq!(best.average_rating, 4.0);
    }

    #[tokio::test]
    async fn stream_failure_stops_later_stages() {
        let db = memory_db().await;
        let movies = csv_file(&format!("{MOVIES_HEADER}m1,X,2000,u,1,90,80\n"));
        let users = csv_file(USERS);
        let cfg = config(
            movies.path().into(),
            PathBuf::from("/nonexistent/critics.csv"),
            users.path().into(),
        );

        let err = run_pipeline(&db, &cfg).await.unwrap_err();
        assert!(format!("{err:#}").contains("critic ingestion"));
        let counts = db.collection_counts().await.unwrap();
        assert_eq!(counts.movies, 1);
        assert_eq!(counts.users, 0);
    }

    #[tokio::test]
    async fn clear_before_ingest_replaces_previous_run() {
        let db = memory_db().await;
        let first = csv_file(&format!("{MOVIES_HEADER}m0,Old,1999,u0,5,10,10\n"));
        let movies = csv_file(&format!("{MOVIES_HEADER}m1,X,2000,u,1,90,80\n"));
        let critics = csv_file(CRITICS);
        let users = csv_file(USERS);

        ingest_csv(&db, &MovieIngestor, first.path()).await.unwrap();
        let mut cfg = config(
            movies.path().into(),
            critics.path().into(),
            users.path().into(),
        );
        cfg.clear_before_ingest = true;
        run_ingest(&db, &cfg).await.unwrap();

        assert!(db.find_movie_by_title("Old").await.unwrap().is_none());
        assert_eq!(db.collection_counts().await.unwrap().movies, 1);
    }

    #[tokio::test]
    async fn skip_ingest_only_runs_reports() {
        let db = memory_db().await;
        let mut cfg = config(
            PathBuf::from("/nonexistent/m.csv"),
            PathBuf::from("/nonexistent/c.csv"),
            PathBuf::from("/nonexistent/u.csv"),
        );
        cfg.skip_ingest = true;

        let outcome = run_pipeline(&db, &cfg).await.unwrap();
        assert!(outcome.ingest.is_empty());
        assert!(outcome.reports.rating_frequencies.is_none());
        assert!(outcome.reports.top_critic.is_none());
    }
}

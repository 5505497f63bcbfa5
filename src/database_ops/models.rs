// Documents stored in the movies / critics / users collections.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::normalization::Rating;

/// Review verdict published alongside a critic review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewState {
    Fresh,
    Rotten,
}

impl ReviewState {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewState::Fresh => "fresh",
            ReviewState::Rotten => "rotten",
        }
    }
}

impl FromStr for ReviewState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fresh" => Ok(ReviewState::Fresh),
            "rotten" => Ok(ReviewState::Rotten),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoreSentiment {
    Positive,
    Negative,
}

impl ScoreSentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreSentiment::Positive => "POSITIVE",
            ScoreSentiment::Negative => "NEGATIVE",
        }
    }
}

impl FromStr for ScoreSentiment {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POSITIVE" => Ok(ScoreSentiment::Positive),
            "NEGATIVE" => Ok(ScoreSentiment::Negative),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for ScoreSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal outside of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

/// Movie fields as written by the movie ingestor.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub movie_id: String,
    pub movie_title: String,
    pub movie_year: i64,
    pub movie_url: String,
    pub movie_rank: i64,
    pub critic_score: String,
    pub audience_score: String,
}

/// Stored movie document; `id` is the store-generated identifier.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub movie_id: String,
    pub movie_title: String,
    pub movie_year: i64,
    #[serde(rename = "movieURL")]
    pub movie_url: String,
    pub movie_rank: i64,
    #[serde(rename = "critic_score")]
    pub critic_score: String,
    #[serde(rename = "audience_score")]
    pub audience_score: String,
}

/// Critic review ready to be upserted; `movie_ref` is the generated movie id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCritic {
    pub review_id: String,
    pub movie_ref: String,
    pub creation_date: NaiveDate,
    pub critic_name: Option<String>,
    pub critic_page_url: Option<String>,
    pub review_state: ReviewState,
    pub is_fresh: bool,
    pub is_rotten: bool,
    pub is_rt_url: bool,
    pub is_top_critic: bool,
    pub publication_url: String,
    pub publication_name: String,
    pub review_url: Option<String>,
    pub score_sentiment: ScoreSentiment,
    pub original_score: Rating,
}

/// Stored critic document as read back from the store.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Critic {
    pub id: String,
    pub review_id: String,
    pub movie_ref: Option<String>,
    pub creation_date: NaiveDate,
    pub critic_name: Option<String>,
    pub critic_page_url: Option<String>,
    pub review_state: String,
    pub is_fresh: bool,
    pub is_rotten: bool,
    pub is_rt_url: bool,
    pub is_top_critic: bool,
    pub publication_url: String,
    pub publication_name: String,
    pub review_url: Option<String>,
    pub score_sentiment: String,
    pub original_score: String,
}

/// User review ready to be written; `movie_ref` is the generated movie id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub movie_ref: String,
    pub rating: f64,
    pub review_id: Option<String>,
    pub is_verified: bool,
    pub is_super_reviewer: bool,
    pub has_spoilers: bool,
    pub has_profanity: bool,
    pub score: f64,
    pub creation_date: NaiveDate,
    pub user_display_name: Option<String>,
    pub user_realm: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: String,
    pub movie_ref: Option<String>,
    pub rating: f64,
    pub review_id: Option<String>,
    pub is_verified: bool,
    pub is_super_reviewer: bool,
    pub has_spoilers: bool,
    pub has_profanity: bool,
    pub score: f64,
    pub creation_date: NaiveDate,
    pub user_display_name: Option<String>,
    pub user_realm: String,
    pub user_id: String,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::db::Db;
use super::ingest::{
    optional, parse_date, parse_number, required, RowError, RowIngestor, RowOutcome,
};
use super::models::NewUser;
use crate::normalization::coerce_flag;

/// How user reviews are written.
///
/// User rows carry no designated natural key, so this is an explicit choice
/// rather than a fixed behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserWriteMode {
    /// Every row becomes a new document (reviews as an append-only log).
    #[default]
    Append,
    /// A row identical on every field to a stored document is not written again.
    UpsertAllFields,
}

/// Raw `users.csv` record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    #[serde(default)]
    pub movie_id: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub review_id: Option<String>,
    #[serde(default)]
    pub is_verified: Option<String>,
    #[serde(default)]
    pub is_super_reviewer: Option<String>,
    #[serde(default)]
    pub has_spoilers: Option<String>,
    #[serde(default)]
    pub has_profanity: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub user_display_name: Option<String>,
    #[serde(default)]
    pub user_realm: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl UserRow {
    pub fn into_user(self, movie_ref: String) -> Result<NewUser, RowError> {
        Ok(NewUser {
            movie_ref,
            rating: parse_number(self.rating, "rating")?,
            review_id: optional(self.review_id),
            is_verified: coerce_flag(self.is_verified.as_deref()),
            is_super_reviewer: coerce_flag(self.is_super_reviewer.as_deref()),
            has_spoilers: coerce_flag(self.has_spoilers.as_deref()),
            has_profanity: coerce_flag(self.has_profanity.as_deref()),
            score: parse_number(self.score, "score")?,
            creation_date: parse_date(self.creation_date, "creationDate")?,
            user_display_name: optional(self.user_display_name),
            user_realm: required(self.user_realm, "userRealm")?,
            user_id: required(self.user_id, "userId")?,
        })
    }
}

pub async fn insert_user(db: &Db, user: &NewUser) -> Result<String, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO users (id, movie_ref, rating, review_id, is_verified, is_super_reviewer,
                            has_spoilers, has_profanity, score, creation_date,
                            user_display_name, user_realm, user_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&user.movie_ref)
    .bind(user.rating)
    .bind(&user.review_id)
    .bind(user.is_verified)
    .bind(user.is_super_reviewer)
    .bind(user.has_spoilers)
    .bind(user.has_profanity)
    .bind(user.score)
    .bind(user.creation_date)
    .bind(&user.user_display_name)
    .bind(&user.user_realm)
    .bind(&user.user_id)
    .execute(&db.pool)
    .await?;
    Ok(id)
}

/// Generated id of a stored document equal to `user` on every field.
pub async fn find_identical_user(db: &Db, user: &NewUser) -> Result<Option<String>, sqlx::Error> {
    // `IS` compares NULLs as equal for the optional columns.
    sqlx::query_scalar(
        "SELECT id FROM users
         WHERE movie_ref = ? AND rating = ? AND review_id IS ? AND is_verified = ?
           AND is_super_reviewer = ? AND has_spoilers = ? AND has_profanity = ?
           AND score = ? AND creation_date = ? AND user_display_name IS ?
           AND user_realm = ? AND user_id = ?
         LIMIT 1",
    )
    .bind(&user.movie_ref)
    .bind(user.rating)
    .bind(&user.review_id)
    .bind(user.is_verified)
    .bind(user.is_super_reviewer)
    .bind(user.has_spoilers)
    .bind(user.has_profanity)
    .bind(user.score)
    .bind(user.creation_date)
    .bind(&user.user_display_name)
    .bind(&user.user_realm)
    .bind(&user.user_id)
    .fetch_optional(&db.pool)
    .await
}

/// Write a user review according to `mode`.
pub async fn write_user(
    db: &Db,
    user: &NewUser,
    mode: UserWriteMode,
) -> Result<RowOutcome, sqlx::Error> {
    if mode == UserWriteMode::UpsertAllFields && find_identical_user(db, user).await?.is_some() {
        return Ok(RowOutcome::Unchanged);
    }
    insert_user(db, user).await?;
    Ok(RowOutcome::Written)
}

/// Resolves the referenced movie, coerces flags, writes per [`UserWriteMode`].
pub struct UserIngestor {
    pub mode: UserWriteMode,
}

impl UserIngestor {
    pub fn new(mode: UserWriteMode) -> Self {
        Self { mode }
    }
}

#[async_trait::async_trait]
impl RowIngestor for UserIngestor {
    type Row = UserRow;

    fn dataset(&self) -> &'static str {
        "users"
    }

    fn row_key(&self, row: &UserRow) -> String {
        format!(
            "userId={} movieId={}",
            row.user_id.as_deref().unwrap_or(""),
            row.movie_id.as_deref().unwrap_or("")
        )
    }

    async fn apply(&self, db: &Db, mut row: UserRow) -> Result<RowOutcome, RowError> {
        let movie_id = required(row.movie_id.take(), "movieId")?;
        let movie_ref = db
            .find_movie_ref(&movie_id)
            .await?
            .ok_or(RowError::MovieNotFound(movie_id))?;
        let user = row.into_user(movie_ref)?;
        Ok(write_user(db, &user, self.mode).await?)
    }
}

//! Run configuration read from a JSON file.
//!
//! The three input paths are mandatory; everything else has a default and
//! falls back to the environment where noted.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::database_ops::users::UserWriteMode;
use crate::util::env as env_util;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_REPORT_MOVIE: &str = "The Philadelphia Story";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{0} must be specified in the config file")]
    MissingKey(&'static str),
}

/// File layout; every key is optional here so missing ones can be reported by name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    movie_data_path: Option<String>,
    critic_review_data_path: Option<String>,
    user_review_data_path: Option<String>,
    database_url: Option<String>,
    max_connections: Option<u32>,
    clear_before_ingest: Option<bool>,
    skip_ingest: Option<bool>,
    report_movie_title: Option<String>,
    user_write_mode: Option<UserWriteMode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub movie_data_path: PathBuf,
    pub critic_review_data_path: PathBuf,
    pub user_review_data_path: PathBuf,
    /// Config `databaseUrl`, then `REEL_DATABASE_URL` / `DATABASE_URL`, then a local file.
    pub database_url: String,
    /// Config `maxConnections`, then `REEL_MAX_CONNECTIONS`, then 1.
    pub max_connections: u32,
    /// Config `clearBeforeIngest`, then `REEL_CLEAR_BEFORE_INGEST`, then false.
    pub clear_before_ingest: bool,
    pub skip_ingest: bool,
    pub report_movie_title: String,
    pub user_write_mode: UserWriteMode,
}

impl IngestConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_raw(raw)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        fn path_key(value: Option<String>, key: &'static str) -> Result<PathBuf, ConfigError> {
            value
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .ok_or(ConfigError::MissingKey(key))
        }

        Ok(Self {
            movie_data_path: path_key(raw.movie_data_path, "movieDataPath")?,
            critic_review_data_path: path_key(raw.critic_review_data_path, "criticReviewDataPath")?,
            user_review_data_path: path_key(raw.user_review_data_path, "userReviewDataPath")?,
            database_url: raw
                .database_url
                .filter(|v| !v.trim().is_empty())
                .or_else(env_util::db_url)
                .unwrap_or_else(|| env_util::DEFAULT_DATABASE_URL.to_string()),
            max_connections: raw
                .max_connections
                .unwrap_or_else(|| env_util::env_parse("REEL_MAX_CONNECTIONS", 1))
                .max(1),
            clear_before_ingest: raw
                .clear_before_ingest
                .unwrap_or_else(|| env_util::env_flag("REEL_CLEAR_BEFORE_INGEST", false)),
            skip_ingest: raw.skip_ingest.unwrap_or(false),
            report_movie_title: raw
                .report_movie_title
                .unwrap_or_else(|| DEFAULT_REPORT_MOVIE.to_string()),
            user_write_mode: raw.user_write_mode.unwrap_or_default(),
        })
    }

    /// Log a redacted view of the effective settings.
    pub fn log_snapshot(&self) {
        env_util::log_snapshot(
            "ingest config",
            &[
                ("movieDataPath", self.movie_data_path.display().to_string()),
                (
                    "criticReviewDataPath",
                    self.critic_review_data_path.display().to_string(),
                ),
                (
                    "userReviewDataPath",
                    self.user_review_data_path.display().to_string(),
                ),
                ("databaseUrl", self.database_url.clone()),
                ("maxConnections", self.max_connections.to_string()),
                ("clearBeforeIngest", self.clear_before_ingest.to_string()),
                ("skipIngest", self.skip_ingest.to_string()),
                ("reportMovieTitle", self.report_movie_title.clone()),
                ("userWriteMode", format!("{:?}", self.user_write_mode)),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PATHS: &str = r#""movieDataPath": "data/movies.csv",
        "criticReviewDataPath": "data/critics.csv",
        "userReviewDataPath": "data/users.csv""#;

    #[test]
    fn reads_paths_and_explicit_options() {
        let cfg = IngestConfig::from_json_str(&format!(
            r#"{{ {PATHS}, "databaseUrl": "sqlite::memory:", "maxConnections": 3,
                 "clearBeforeIngest": true, "skipIngest": true,
                 "reportMovieTitle": "X", "userWriteMode": "upsertAllFields" }}"#
        ))
        .unwrap();
        assert_eq!(cfg.movie_data_path, PathBuf::from("data/movies.csv"));
        assert_eq!(cfg.critic_review_data_path, PathBuf::from("data/critics.csv"));
        assert_eq!(cfg.user_review_data_path, PathBuf::from("data/users.csv"));
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.max_connections, 3);
        assert!(cfg.clear_before_ingest);
        assert!(cfg.skip_ingest);
        assert_eq!(cfg.report_movie_title, "X");
        assert_eq!(cfg.user_write_mode, UserWriteMode::UpsertAllFields);
    }

    #[test]
    fn optional_keys_have_defaults() {
        let cfg = IngestConfig::from_json_str(&format!(
            r#"{{ {PATHS}, "databaseUrl": "sqlite::memory:", "maxConnections": 0 }}"#
        ))
        .unwrap();
        assert_eq!(cfg.max_connections, 1);
        assert!(!cfg.skip_ingest);
        assert_eq!(cfg.report_movie_title, DEFAULT_REPORT_MOVIE);
        assert_eq!(cfg.user_write_mode, UserWriteMode::Append);
    }

    #[test]
    fn missing_or_blank_paths_are_fatal() {
        let err = IngestConfig::from_json_str(
            r#"{ "movieDataPath": "m.csv", "criticReviewDataPath": "c.csv" }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("userReviewDataPath")));

        let err = IngestConfig::from_json_str(
            r#"{ "movieDataPath": " ", "criticReviewDataPath": "c.csv", "userReviewDataPath": "u.csv" }"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "movieDataPath must be specified in the config file"
        );
    }

    #[test]
    fn load_reports_unreadable_and_malformed_files() {
        let err = IngestConfig::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = IngestConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_reads_a_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ {PATHS}, \"databaseUrl\": \"sqlite::memory:\" }}").unwrap();
        let cfg = IngestConfig::load(file.path()).unwrap();
        assert_eq!(cfg.user_review_data_path, PathBuf::from("data/users.csv"));
    }
}

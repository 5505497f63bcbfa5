//! Document store access: connection, per-dataset ingestors and reports.

pub mod critics;
pub mod db;
pub mod ingest;
pub mod models;
pub mod movies;
pub mod reports;
pub mod users;

//! Library side of the operator binaries in `src/bin`.

pub mod db_counts;
pub mod reports;

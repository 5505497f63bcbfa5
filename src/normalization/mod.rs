//! Field normalizers applied to review rows before they are stored.

pub mod flag;
pub mod rating;

pub use flag::coerce_flag;
pub use rating::{normalize_rating, LetterGrade, Rating, RatingError};

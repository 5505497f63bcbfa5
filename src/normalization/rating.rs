use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Upper bound of the unified rating scale.
pub const MAX_RATING: f64 = 5.0;

/// A critic rating projected onto the unified 0-5 scale, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Rating(f64);

impl Rating {
    /// Build a rating from an arbitrary value: clamps into [0, 5] and rounds to one decimal.
    pub fn new(value: f64) -> Self {
        Self(round_tenths(value.clamp(0.0, MAX_RATING)))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// String encoding used by the store (`"4.0"`, `"3.5"`, `"0.0"`).
    pub fn encode(self) -> String {
        self.to_string()
    }
}

/// Nearest tenth to the exact binary value of `value` (non-negative), ties upward.
///
/// `value * 10.0` can itself round onto a half, so the midpoint test is done
/// with a single fused operation whose sign is exact.
fn round_tenths(value: f64) -> f64 {
    let lower = (value * 10.0).floor();
    let above_mid = value.mul_add(20.0, -(2.0 * lower + 1.0));
    let tenths = if above_mid >= 0.0 { lower + 1.0 } else { lower };
    tenths / 10.0
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RatingError {
    #[error("rating fraction {raw:?} has a non-numeric part")]
    NotANumber { raw: String },
    #[error("rating fraction {raw:?} has a zero denominator")]
    ZeroDenominator { raw: String },
}

/// Letter grades found in critic reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterGrade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
}

impl LetterGrade {
    pub fn score(self) -> f64 {
        match self {
            LetterGrade::APlus => 5.0,
            LetterGrade::A => 4.5,
            LetterGrade::AMinus => 4.0,
            LetterGrade::BPlus => 3.5,
            LetterGrade::B => 3.0,
            LetterGrade::BMinus => 2.5,
            LetterGrade::CPlus => 2.0,
            LetterGrade::C => 1.5,
            LetterGrade::CMinus => 1.0,
            LetterGrade::DPlus => 0.5,
            LetterGrade::D | LetterGrade::DMinus | LetterGrade::F => 0.0,
        }
    }
}

impl FromStr for LetterGrade {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "A+" => LetterGrade::APlus,
            "A" => LetterGrade::A,
            "A-" => LetterGrade::AMinus,
            "B+" => LetterGrade::BPlus,
            "B" => LetterGrade::B,
            "B-" => LetterGrade::BMinus,
            "C+" => LetterGrade::CPlus,
            "C" => LetterGrade::C,
            "C-" => LetterGrade::CMinus,
            "D+" => LetterGrade::DPlus,
            "D" => LetterGrade::D,
            "D-" => LetterGrade::DMinus,
            "F" => LetterGrade::F,
            _ => return Err(()),
        })
    }
}

/// Normalize a raw critic score token into the 0-5 scale.
///
/// - `"n/d"` fractions become `(n / d) * 5`, rounded to one decimal.
/// - Letter grades (`A+` .. `F`) map through a fixed table.
/// - Anything else falls back to 0.
///
/// Only a malformed fraction is an error; the caller decides what to do with the row.
pub fn normalize_rating(raw: &str) -> Result<Rating, RatingError> {
    if let Some((num, den)) = raw.split_once('/') {
        return normalize_fraction(raw, num, den);
    }
    Ok(raw
        .parse::<LetterGrade>()
        .map(|grade| Rating::new(grade.score()))
        .unwrap_or_default())
}

fn normalize_fraction(raw: &str, num: &str, den: &str) -> Result<Rating, RatingError> {
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RatingError::NotANumber {
                raw: raw.to_string(),
            })
    };
    let numerator = parse(num)?;
    let denominator = parse(den)?;
    if denominator == 0.0 {
        return Err(RatingError::ZeroDenominator {
            raw: raw.to_string(),
        });
    }
    Ok(Rating::new(numerator / denominator * MAX_RATING))
}

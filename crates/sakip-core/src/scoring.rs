//! # Scoring Engine
//!
//! Weighted overall score for an assessment's criteria, and the letter-grade
//! band it falls into. Recomputation on criterion change is the storage
//! engine's job; this module is pure arithmetic.

use crate::decimal::Decimal2;
use crate::model::AssessmentCriterion;
use serde::{Deserialize, Serialize};

/// Performance-level letter grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
}

impl Grade {
    /// The grade band a score falls into.
    #[must_use]
    pub fn for_score(score: Decimal2) -> Self {
        if score >= Decimal2::from_int(90) {
            Self::A
        } else if score >= Decimal2::from_int(80) {
            Self::B
        } else if score >= Decimal2::from_int(70) {
            Self::C
        } else if score >= Decimal2::from_int(60) {
            Self::D
        } else {
            Self::E
        }
    }

    /// The performance-level label for this grade.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Excellent",
            Self::B => "Good",
            Self::C => "Satisfactory",
            Self::D => "Needs Improvement",
            Self::E => "Poor",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        };
        f.write_str(letter)
    }
}

/// Weighted mean of the criteria scores, rounded to two decimals.
///
/// `None` when there are no criteria or the weights sum to zero - an
/// assessment without meaningful criteria has no score rather than a
/// misleading zero.
#[must_use]
pub fn compute_overall_score(criteria: &[AssessmentCriterion]) -> Option<Decimal2> {
    let pairs: Vec<(Decimal2, Decimal2)> =
        criteria.iter().map(|c| (c.score, c.weight)).collect();
    Decimal2::weighted_mean(&pairs)
}

// =============================================================================
// TESTS
// =============================================================================

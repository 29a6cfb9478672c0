//! # Achievement Calculator
//!
//! Turns an actual value and its yearly target into an achievement
//! percentage and a status label. Pure arithmetic over `Decimal2`.

use crate::decimal::Decimal2;
use serde::{Deserialize, Serialize};

/// How an actual value measures against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementStatus {
    /// No target set (or a zero target); no meaningful percentage.
    NoTarget,
    /// Percentage at or above 100.
    Achieved,
    /// Percentage in [80, 100).
    PartiallyAchieved,
    /// Below 80 but the minimum floor is met (or no floor exists).
    MinimumMet,
    NotAchieved,
}

impl AchievementStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoTarget => "no_target",
            Self::Achieved => "achieved",
            Self::PartiallyAchieved => "partially_achieved",
            Self::MinimumMet => "minimum_met",
            Self::NotAchieved => "not_achieved",
        }
    }
}

impl std::fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The computed achievement of one actual value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub percentage: Decimal2,
    pub status: AchievementStatus,
}

/// Compute achievement for `actual` against `target` with an optional
/// minimum floor.
///
/// A missing or zero target yields a zero percentage and `NoTarget`.
#[must_use]
pub fn achievement(
    actual: Decimal2,
    target: Option<Decimal2>,
    minimum: Option<Decimal2>,
) -> Achievement {
    let Some(target) = target.filter(|t| !t.is_zero()) else {
        return Achievement {
            percentage: Decimal2::ZERO,
            status: AchievementStatus::NoTarget,
        };
    };

    let percentage = actual.percent_of(target);
    let status = if percentage >= Decimal2::ONE_HUNDRED {
        AchievementStatus::Achieved
    } else if percentage >= Decimal2::from_int(80) {
        AchievementStatus::PartiallyAchieved
    } else if minimum.is_none_or(|floor| actual >= floor) {
        AchievementStatus::MinimumMet
    } else {
        AchievementStatus::NotAchieved
    };

    Achievement { percentage, status }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal2 {
        Decimal2::from_int(v)
    }

    #[test]
    fn partially_achieved_band() {
        let result = achievement(dec(80), Some(dec(100)), Some(dec(70)));
        assert_eq!(result.percentage, dec(80));
        assert_eq!(result.status, AchievementStatus::PartiallyAchieved);
    }

    #[test]
    fn achieved_at_exactly_one_hundred() {
        let result = achievement(dec(100), Some(dec(100)), None);
        assert_eq!(result.percentage, Decimal2::ONE_HUNDRED);
        assert_eq!(result.status, AchievementStatus::Achieved);

        // Overachievement also counts.
        let over = achievement(dec(120), Some(dec(100)), None);
        assert_eq!(over.status, AchievementStatus::Achieved);
    }

    #[test]
    fn below_floor_is_not_achieved() {
        let result = achievement(dec(60), Some(dec(100)), Some(dec(70)));
        assert_eq!(result.percentage, dec(60));
        assert_eq!(result.status, AchievementStatus::NotAchieved);
    }

    #[test]
    fn at_or_above_floor_is_minimum_met() {
        let result = achievement(dec(70), Some(dec(100)), Some(dec(70)));
        assert_eq!(result.status, AchievementStatus::MinimumMet);

        // Without a floor anything below 80% still counts as minimum met.
        let no_floor = achievement(dec(10), Some(dec(100)), None);
        assert_eq!(no_floor.status, AchievementStatus::MinimumMet);
    }

    #[test]
    fn missing_or_zero_target() {
        let missing = achievement(dec(50), None, None);
        assert_eq!(missing.percentage, Decimal2::ZERO);
        assert_eq!(missing.status, AchievementStatus::NoTarget);

        let zero = achievement(dec(50), Some(Decimal2::ZERO), Some(dec(10)));
        assert_eq!(zero.percentage, Decimal2::ZERO);
        assert_eq!(zero.status, AchievementStatus::NoTarget);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        let result = achievement(dec(1), Some(dec(3)), None);
        assert_eq!(result.percentage, Decimal2::from_hundredths(3333));
    }
}

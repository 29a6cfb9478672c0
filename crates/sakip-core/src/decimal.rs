//! # Fixed-Point Decimal Arithmetic
//!
//! All two-decimal quantities (actual values, targets, percentages, scores,
//! weights) are stored as an integer count of hundredths. Division rounds
//! half away from zero, so every documented rounding case is exact and no
//! floating point is needed anywhere in the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A two-decimal fixed-point number, stored as hundredths.
///
/// `Decimal2::from_int(83)` is `83.00`; `Decimal2::from_hundredths(8333)`
/// is `83.33`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Decimal2(i64);

/// Error for unparseable decimal literals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal `{0}`")]
pub struct ParseDecimalError(String);

impl Decimal2 {
    /// 0.00
    pub const ZERO: Self = Self(0);
    /// 100.00 - the achievement threshold and percentage base.
    pub const ONE_HUNDRED: Self = Self(10_000);

    /// Build from a whole number.
    #[must_use]
    pub const fn from_int(value: i64) -> Self {
        Self(value.saturating_mul(100))
    }

    /// Build from a raw hundredths count.
    #[must_use]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// The raw hundredths count.
    #[must_use]
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating sum over an iterator.
    pub fn sum<I: IntoIterator<Item = Self>>(values: I) -> Self {
        values
            .into_iter()
            .fold(Self::ZERO, |acc, v| acc.saturating_add(v))
    }

    /// `self / base * 100`, rounded to two decimals.
    ///
    /// Returns `ZERO` when `base` is zero; callers decide what an absent
    /// target means (see the achievement calculator).
    #[must_use]
    pub fn percent_of(self, base: Self) -> Self {
        if base.0 == 0 {
            return Self::ZERO;
        }
        let num = i128::from(self.0) * 10_000;
        Self(div_round_half_away(num, i128::from(base.0)))
    }

    /// Arithmetic mean, rounded to two decimals. `None` for an empty slice.
    #[must_use]
    pub fn mean(values: &[Self]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let total: i128 = values.iter().map(|v| i128::from(v.0)).sum();
        Some(Self(div_round_half_away(total, values.len() as i128)))
    }

    /// Weighted mean of `(value, weight)` pairs, rounded to two decimals.
    ///
    /// Returns `None` for an empty slice or a zero total weight.
    #[must_use]
    pub fn weighted_mean(pairs: &[(Self, Self)]) -> Option<Self> {
        if pairs.is_empty() {
            return None;
        }
        let total_weight: i128 = pairs.iter().map(|(_, w)| i128::from(w.0)).sum();
        if total_weight == 0 {
            return None;
        }
        let weighted: i128 = pairs
            .iter()
            .map(|(v, w)| i128::from(v.0) * i128::from(w.0))
            .sum();
        Some(Self(div_round_half_away(weighted, total_weight)))
    }
}

/// Integer division rounding half away from zero, matching `round(x, 2)`
/// in the reporting rules.
fn div_round_half_away(num: i128, den: i128) -> i64 {
    debug_assert!(den != 0);
    let quot = num / den;
    let rem = num % den;
    let adjust = if rem.unsigned_abs() * 2 >= den.unsigned_abs() {
        if (num < 0) == (den < 0) { 1 } else { -1 }
    } else {
        0
    };
    (quot + adjust) as i64
}

impl std::fmt::Display for Decimal2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::str::FromStr for Decimal2 {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseDecimalError(s.to_string());
        let (sign, body) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() || frac_part.len() > 2 {
            return Err(bad());
        }
        let int: i64 = int_part.parse().map_err(|_| bad())?;
        let frac: i64 = if frac_part.is_empty() {
            0
        } else {
            let padded = format!("{frac_part:0<2}");
            padded.parse().map_err(|_| bad())?
        };
        Ok(Self(
            sign.saturating_mul(int.saturating_mul(100).saturating_add(frac)),
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_rounds_to_two_decimals() {
        let actual = Decimal2::from_int(80);
        let target = Decimal2::from_int(100);
        assert_eq!(actual.percent_of(target), Decimal2::from_hundredths(8000));

        // 1/3 * 100 = 33.333... -> 33.33
        let third = Decimal2::from_int(1).percent_of(Decimal2::from_int(3));
        assert_eq!(third, Decimal2::from_hundredths(3333));
    }

    #[test]
    fn percent_of_zero_base_is_zero() {
        assert_eq!(
            Decimal2::from_int(50).percent_of(Decimal2::ZERO),
            Decimal2::ZERO
        );
    }

    #[test]
    fn mean_of_quarter_percentages() {
        let values = [
            Decimal2::from_int(100),
            Decimal2::from_int(80),
            Decimal2::from_int(90),
        ];
        assert_eq!(Decimal2::mean(&values), Some(Decimal2::from_int(90)));
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(Decimal2::mean(&[]), None);
    }

    #[test]
    fn weighted_mean_matches_reporting_rules() {
        // (90*2 + 70*1) / 3 = 83.333... -> 83.33
        let pairs = [
            (Decimal2::from_int(90), Decimal2::from_int(2)),
            (Decimal2::from_int(70), Decimal2::from_int(1)),
        ];
        assert_eq!(
            Decimal2::weighted_mean(&pairs),
            Some(Decimal2::from_hundredths(8333))
        );
    }

    #[test]
    fn weighted_mean_zero_weight_is_none() {
        let pairs = [(Decimal2::from_int(90), Decimal2::ZERO)];
        assert_eq!(Decimal2::weighted_mean(&pairs), None);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        // 0.005 -> 0.01
        assert_eq!(div_round_half_away(1, 2), 1);
        // -0.005 -> -0.01
        assert_eq!(div_round_half_away(-1, 2), -1);
        // 83.333 stays 83.33 (via weighted_mean above), 83.335 rounds up
        assert_eq!(div_round_half_away(16_667, 2), 8334);
    }

    #[test]
    fn display_and_parse_roundtrip() {
        let cases = ["0.00", "83.33", "-12.50", "100.00"];
        for case in cases {
            let parsed: Decimal2 = case.parse().expect("parse");
            assert_eq!(parsed.to_string(), case);
        }
        assert_eq!("80".parse::<Decimal2>(), Ok(Decimal2::from_int(80)));
        assert_eq!("80.5".parse::<Decimal2>(), Ok(Decimal2::from_hundredths(8050)));
        assert!("80.555".parse::<Decimal2>().is_err());
        assert!("".parse::<Decimal2>().is_err());
    }
}

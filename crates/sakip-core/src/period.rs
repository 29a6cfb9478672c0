//! # Reporting Periods
//!
//! Calendar months, quarters, and the `YYYY-MM` period key used by monthly
//! performance-data records. Quarters map to fixed month triples; the
//! mapping is a closed table rather than string comparison.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for unparseable `YYYY-MM` period strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid period `{0}`, expected YYYY-MM")]
pub struct ParsePeriodError(String);

// =============================================================================
// MONTH
// =============================================================================

/// A calendar month.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// All months, January first.
    pub const ALL: [Self; 12] = [
        Self::January,
        Self::February,
        Self::March,
        Self::April,
        Self::May,
        Self::June,
        Self::July,
        Self::August,
        Self::September,
        Self::October,
        Self::November,
        Self::December,
    ];

    /// 1-based month number.
    #[must_use]
    pub const fn number(self) -> u32 {
        self as u32 + 1
    }

    /// Build from a 1-based month number.
    #[must_use]
    pub const fn from_number(number: u32) -> Option<Self> {
        if number >= 1 && number <= 12 {
            Some(Self::ALL[(number - 1) as usize])
        } else {
            None
        }
    }

    /// The quarter this month belongs to.
    #[must_use]
    pub const fn quarter(self) -> Quarter {
        match self {
            Self::January | Self::February | Self::March => Quarter::Q1,
            Self::April | Self::May | Self::June => Quarter::Q2,
            Self::July | Self::August | Self::September => Quarter::Q3,
            Self::October | Self::November | Self::December => Quarter::Q4,
        }
    }
}

// =============================================================================
// QUARTER
// =============================================================================

/// A calendar quarter (triwulan).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// 1-based quarter number.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    /// Build from a 1-based quarter number.
    #[must_use]
    pub const fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::Q1),
            2 => Some(Self::Q2),
            3 => Some(Self::Q3),
            4 => Some(Self::Q4),
            _ => None,
        }
    }

    /// The quarter containing a given 1-based month number
    /// (`ceil(month / 3)`).
    #[must_use]
    pub const fn from_month_number(month: u32) -> Option<Self> {
        match Month::from_number(month) {
            Some(m) => Some(m.quarter()),
            None => None,
        }
    }

    /// The fixed month triple for this quarter.
    #[must_use]
    pub const fn months(self) -> [Month; 3] {
        match self {
            Self::Q1 => [Month::January, Month::February, Month::March],
            Self::Q2 => [Month::April, Month::May, Month::June],
            Self::Q3 => [Month::July, Month::August, Month::September],
            Self::Q4 => [Month::October, Month::November, Month::December],
        }
    }

    /// Last day of the quarter's third month.
    #[must_use]
    pub fn end_date(self, year: i32) -> Option<chrono::NaiveDate> {
        let first_of_next = match self {
            Self::Q4 => chrono::NaiveDate::from_ymd_opt(year + 1, 1, 1),
            _ => chrono::NaiveDate::from_ymd_opt(year, self.number() * 3 + 1, 1),
        }?;
        first_of_next.pred_opt()
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

// =============================================================================
// REPORT PERIOD (YYYY-MM)
// =============================================================================

/// The year-month period of a monthly performance-data record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ReportPeriod {
    pub year: i32,
    pub month: Month,
}

impl ReportPeriod {
    #[must_use]
    pub const fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The quarter this period rolls up into.
    #[must_use]
    pub const fn quarter(self) -> Quarter {
        self.month.quarter()
    }

    /// The canonical `YYYY-MM` storage key.
    #[must_use]
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month.number())
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParsePeriodError(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(bad)?;
        let year: i32 = year.parse().map_err(|_| bad())?;
        let month: u32 = month.parse().map_err(|_| bad())?;
        let month = Month::from_number(month).ok_or_else(bad)?;
        Ok(Self { year, month })
    }
}

// =============================================================================
// TESTS
// =============================================================================

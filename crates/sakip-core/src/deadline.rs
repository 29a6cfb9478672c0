//! # Deadline Gate
//!
//! Calendar windows that close submissions. Monthly performance data may be
//! submitted until 15 days after the end of its reporting quarter; yearly
//! targets during the planning season (November-December) or up to 15 days
//! before the next quarter begins. Superusers and module admins bypass both
//! gates.

use crate::actor::Actor;
use crate::error::WorkflowError;
use crate::period::{Quarter, ReportPeriod};
use chrono::{Datelike, Days, NaiveDate};

/// Grace period after a quarter ends during which its months may still be
/// submitted.
pub const SUBMISSION_GRACE_DAYS: u64 = 15;

/// Lead time before the next quarter during which targets may still be
/// submitted.
pub const TARGET_LEAD_DAYS: u64 = 15;

// =============================================================================
// MONTHLY DATA WINDOW
// =============================================================================

/// Last day on which a record for `period` may be submitted: the end of the
/// period's quarter plus the grace days.
#[must_use]
pub fn monthly_submission_deadline(period: ReportPeriod) -> Option<NaiveDate> {
    period
        .quarter()
        .end_date(period.year)?
        .checked_add_days(Days::new(SUBMISSION_GRACE_DAYS))
}

/// Gate a monthly submission against the calendar.
pub fn check_monthly_submission(
    actor: &Actor,
    period: ReportPeriod,
    today: NaiveDate,
) -> Result<(), WorkflowError> {
    if actor.bypasses_deadlines() {
        return Ok(());
    }
    let Some(deadline) = monthly_submission_deadline(period) else {
        return Err(WorkflowError::Storage(format!(
            "period {period} outside the calendar range"
        )));
    };
    if today <= deadline {
        Ok(())
    } else {
        Err(WorkflowError::DeadlineExceeded { deadline })
    }
}

// =============================================================================
// TARGET WINDOW
// =============================================================================

/// First day of the quarter after the one containing `today`.
#[must_use]
pub fn next_quarter_start(today: NaiveDate) -> Option<NaiveDate> {
    match Quarter::from_month_number(today.month())? {
        Quarter::Q4 => NaiveDate::from_ymd_opt(today.year() + 1, 1, 1),
        quarter => NaiveDate::from_ymd_opt(today.year(), quarter.number() * 3 + 1, 1),
    }
}

/// Last day of the in-quarter target window: the lead days before the next
/// quarter begins.
#[must_use]
pub fn target_submission_deadline(today: NaiveDate) -> Option<NaiveDate> {
    next_quarter_start(today)?.checked_sub_days(Days::new(TARGET_LEAD_DAYS))
}

/// Whether targets may be submitted on `today`: always during the
/// November-December planning season, otherwise only up to the lead-time
/// cutoff before the next quarter.
#[must_use]
pub fn target_window_open(today: NaiveDate) -> bool {
    if today.month() >= 11 {
        return true;
    }
    match target_submission_deadline(today) {
        Some(deadline) => today <= deadline,
        None => false,
    }
}

/// Gate a target submission against the calendar.
pub fn check_target_submission(actor: &Actor, today: NaiveDate) -> Result<(), WorkflowError> {
    if actor.bypasses_deadlines() || target_window_open(today) {
        return Ok(());
    }
    let Some(deadline) = target_submission_deadline(today) else {
        return Err(WorkflowError::Storage(format!(
            "date {today} outside the calendar range"
        )));
    };
    Err(WorkflowError::DeadlineExceeded { deadline })
}

// =============================================================================
// TESTS
// =============================================================================

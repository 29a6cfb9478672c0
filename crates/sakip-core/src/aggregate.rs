//! # Quarterly Aggregation Engine
//!
//! Rolls three monthly performance-data records up into one quarterly draft:
//! actual values are summed, achievement percentages averaged, narrative
//! fields joined. The engine is pure over the records it is handed; the
//! caller decides which statuses are eligible and the storage layer enforces
//! the one-report-per-quarter invariant.

use crate::decimal::Decimal2;
use crate::error::WorkflowError;
use crate::ids::{IndicatorId, InstansiId};
use crate::model::{DataStatus, PerformanceData, QuarterlyReport};
use crate::period::Quarter;

/// Roll up the monthly records of `(indicator, year, quarter)` into a draft
/// quarterly report.
///
/// Records for other indicators, years, or quarters are ignored, so callers
/// may pass an unfiltered batch. Fails with `NoData` when no record matches.
pub fn aggregate_quarter(
    indicator: IndicatorId,
    instansi: InstansiId,
    year: i32,
    quarter: Quarter,
    monthly: &[PerformanceData],
) -> Result<QuarterlyReport, WorkflowError> {
    let matched: Vec<&PerformanceData> = monthly
        .iter()
        .filter(|record| {
            record.indicator == indicator
                && record.instansi == instansi
                && record.period.year == year
                && record.period.quarter() == quarter
        })
        .collect();

    if matched.is_empty() {
        return Err(WorkflowError::NoData);
    }

    let nilai_realisasi = Decimal2::sum(matched.iter().map(|r| r.actual_value));

    let percentages: Vec<Decimal2> = matched
        .iter()
        .filter_map(|r| r.persentase_capaian)
        .collect();
    let persentase_capaian = Decimal2::mean(&percentages).unwrap_or(Decimal2::ZERO);

    Ok(QuarterlyReport {
        indicator,
        instansi,
        year,
        quarter,
        nilai_realisasi,
        persentase_capaian,
        kendala: join_narratives(matched.iter().map(|r| r.kendala.as_deref())),
        tindak_lanjut: join_narratives(matched.iter().map(|r| r.tindak_lanjut.as_deref())),
        // Rollups always start their own review cycle.
        status: DataStatus::Draft,
    })
}

/// Join the non-empty narrative values with `"; "`.
fn join_narratives<'a, I>(values: I) -> String
where
    I: Iterator<Item = Option<&'a str>>,
{
    values
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// TESTS
// =============================================================================

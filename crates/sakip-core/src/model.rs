//! # Domain Model
//!
//! Entity records and their status enums. Statuses are closed enums with
//! explicit transition tables (see `lifecycle`), never free strings, so an
//! illegal state is unrepresentable rather than merely unvalidated.

use crate::decimal::Decimal2;
use crate::ids::{
    AssessmentId, CriterionId, DataId, EvidenceId, IndicatorId, InstansiId, TargetId, UserId,
};
use crate::period::{Quarter, ReportPeriod};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// ENTITY KINDS AND THE AUTHORIZATION VIEW
// =============================================================================

/// The kinds of records the workflow engine governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Instansi,
    User,
    Indicator,
    Target,
    PerformanceData,
    EvidenceDocument,
    Assessment,
    QuarterlyReport,
}

impl EntityKind {
    /// Stable label used in audit entries and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Instansi => "instansi",
            Self::User => "user",
            Self::Indicator => "indicator",
            Self::Target => "target",
            Self::PerformanceData => "performance_data",
            Self::EvidenceDocument => "evidence_document",
            Self::Assessment => "assessment",
            Self::QuarterlyReport => "quarterly_report",
        }
    }
}

/// The slice of an entity the authorization evaluator looks at: kind,
/// owning institution, current status, record owner, and (for user
/// targets) whether the target account is a superuser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: u64,
    pub instansi: Option<InstansiId>,
    pub status: &'static str,
    pub owner: Option<UserId>,
    pub target_is_superuser: bool,
}

impl EntityRef {
    #[must_use]
    pub fn new(kind: EntityKind, id: u64) -> Self {
        Self {
            kind,
            id,
            instansi: None,
            status: "",
            owner: None,
            target_is_superuser: false,
        }
    }
}

// =============================================================================
// STATUS ENUMS
// =============================================================================

/// Lifecycle of performance data and evidence documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    Draft,
    Submitted,
    Validated,
    Rejected,
    Audited,
}

impl DataStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Validated => "validated",
            Self::Rejected => "rejected",
            Self::Audited => "audited",
        }
    }

    /// Terminal-locked statuses cannot be left by normal transitions.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Validated | Self::Audited)
    }
}

/// Lifecycle of yearly targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    /// Reopened by the privileged revise action; editable like a draft.
    Revised,
}

impl TargetStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Revised => "revised",
        }
    }

    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Lifecycle of assessments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Pending,
    InReview,
    Completed,
    Approved,
    Rejected,
}

impl AssessmentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Completed => "completed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Approved)
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A government institution - the tenant boundary for all records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instansi {
    pub id: InstansiId,
    pub code: String,
    pub name: String,
    pub active: bool,
}

/// A stored user account.
///
/// Accounts referenced by audit history are soft-deleted, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub instansi: Option<InstansiId>,
    pub permissions: BTreeSet<String>,
    pub superuser: bool,
    pub deleted: bool,
}

impl UserRecord {
    /// Authorization view of this account as an action target.
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: EntityKind::User,
            id: self.id.0,
            instansi: self.instansi,
            status: if self.deleted { "deleted" } else { "active" },
            owner: Some(self.id),
            target_is_superuser: self.superuser,
        }
    }
}

/// A measurable performance metric owned by an institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceIndicator {
    pub id: IndicatorId,
    pub instansi: InstansiId,
    /// Unique indicator code, e.g. `IKU-01`.
    pub code: String,
    pub name: String,
    pub measurement_unit: String,
    pub weight: Decimal2,
    pub mandatory: bool,
    /// Soft-delete tombstone; historical data keeps referencing the row.
    pub deleted: bool,
}

/// The yearly goal for an indicator. One per (indicator, year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub indicator: IndicatorId,
    pub instansi: InstansiId,
    pub year: i32,
    pub target_value: Decimal2,
    /// Optional floor; `minimum_value <= target_value` when both set.
    pub minimum_value: Option<Decimal2>,
    pub justification: Option<String>,
    pub status: TargetStatus,
    pub created_by: UserId,
    pub submitted_by: Option<UserId>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Target {
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: EntityKind::Target,
            id: self.id.0,
            instansi: Some(self.instansi),
            status: self.status.as_str(),
            owner: Some(self.created_by),
            target_is_superuser: false,
        }
    }
}

/// A monthly actual-value record for an indicator.
/// One per (indicator, institution, period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceData {
    pub id: DataId,
    pub indicator: IndicatorId,
    pub instansi: InstansiId,
    pub period: ReportPeriod,
    pub actual_value: Decimal2,
    /// Achievement percentage recorded at submission time.
    pub persentase_capaian: Option<Decimal2>,
    /// Obstacles narrative.
    pub kendala: Option<String>,
    /// Follow-up narrative.
    pub tindak_lanjut: Option<String>,
    pub status: DataStatus,
    pub data_quality: Option<String>,
    pub created_by: UserId,
    pub submitted_by: Option<UserId>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub validation_notes: Option<String>,
    pub validated_by: Option<UserId>,
    pub validated_at: Option<DateTime<Utc>>,
    pub audited_by: Option<UserId>,
    pub audited_at: Option<DateTime<Utc>>,
}

impl PerformanceData {
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: EntityKind::PerformanceData,
            id: self.id.0,
            instansi: Some(self.instansi),
            status: self.status.as_str(),
            owner: Some(self.created_by),
            target_is_superuser: false,
        }
    }
}

/// A file attached to a performance-data record as proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceDocument {
    pub id: EvidenceId,
    pub data: DataId,
    pub instansi: InstansiId,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub status: DataStatus,
    pub uploaded_by: UserId,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl EvidenceDocument {
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: EntityKind::EvidenceDocument,
            id: self.id.0,
            instansi: Some(self.instansi),
            status: self.status.as_str(),
            owner: Some(self.uploaded_by),
            target_is_superuser: false,
        }
    }
}

/// An evaluator's scored review of one performance-data record.
/// One per performance-data record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub data: DataId,
    pub instansi: InstansiId,
    pub assessed_by: UserId,
    /// Weighted mean of the criteria; `None` until criteria exist.
    pub overall_score: Option<Decimal2>,
    pub comments: Option<String>,
    pub status: AssessmentStatus,
    pub assessed_at: Option<DateTime<Utc>>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Assessment {
    #[must_use]
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: EntityKind::Assessment,
            id: self.id.0,
            instansi: Some(self.instansi),
            status: self.status.as_str(),
            owner: Some(self.assessed_by),
            target_is_superuser: false,
        }
    }
}

/// A weighted criterion within an assessment. Scores are 0-100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentCriterion {
    pub id: CriterionId,
    pub assessment: AssessmentId,
    pub name: String,
    pub score: Decimal2,
    pub weight: Decimal2,
    pub justification: Option<String>,
}

/// The derived quarterly rollup of three monthly records.
/// One per (indicator, year, quarter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyReport {
    pub indicator: IndicatorId,
    pub instansi: InstansiId,
    pub year: i32,
    pub quarter: Quarter,
    /// Sum of the monthly actual values.
    pub nilai_realisasi: Decimal2,
    /// Two-decimal mean of the monthly achievement percentages.
    pub persentase_capaian: Decimal2,
    /// Monthly obstacle narratives joined with `"; "`.
    pub kendala: String,
    /// Monthly follow-up narratives joined with `"; "`.
    pub tindak_lanjut: String,
    /// Always created as a fresh draft.
    pub status: DataStatus,
}

// =============================================================================
// TESTS
// =============================================================================

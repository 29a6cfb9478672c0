//! # SAKIP Core
//!
//! Deterministic workflow and authorization engine for institutional
//! performance reporting: who may do what, which lifecycle edges exist,
//! when the calendar closes a submission window, and how monthly numbers
//! roll up into quarterly reports and weighted scores.
//!
//! Everything time- or identity-dependent takes `actor` and `now` as
//! explicit parameters; nothing reads a global clock or ambient user, so
//! every rule is testable in isolation. Two-decimal quantities use the
//! `Decimal2` fixed-point type - no floating point anywhere.
//!
//! ## Modules
//!
//! - [`authz`]: declarative per-action permission rules, one evaluator
//! - [`lifecycle`]: per-entity transition tables and the checked pipeline
//! - [`deadline`]: calendar windows for monthly data and yearly targets
//! - [`aggregate`]: monthly-to-quarterly rollups
//! - [`scoring`]: weighted assessment scores and grade bands
//! - [`achievement`]: actual-vs-target percentages and status labels
//! - [`storage`]: redb-backed record store with uniqueness indexes
//! - [`engine`]: the facade wiring rules to storage and the audit trail

pub mod achievement;
pub mod actor;
pub mod aggregate;
pub mod audit;
pub mod authz;
pub mod deadline;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod model;
pub mod period;
pub mod scoring;
pub mod storage;

pub use achievement::{achievement, Achievement, AchievementStatus};
pub use actor::{perm, Actor};
pub use aggregate::aggregate_quarter;
pub use audit::{AuditEntry, AuditSink, MemoryAuditSink};
pub use authz::{can_perform, Action, ActionRule};
pub use decimal::Decimal2;
pub use engine::WorkflowEngine;
pub use error::WorkflowError;
pub use ids::{
    AssessmentId, CriterionId, DataId, EvidenceId, IndicatorId, InstansiId, TargetId, UserId,
};
pub use lifecycle::TransitionCtx;
pub use model::{
    Assessment, AssessmentCriterion, AssessmentStatus, DataStatus, EntityKind, EntityRef,
    EvidenceDocument, Instansi, PerformanceData, PerformanceIndicator, QuarterlyReport, Target,
    TargetStatus, UserRecord,
};
pub use period::{Month, Quarter, ReportPeriod};
pub use scoring::{compute_overall_score, Grade};
pub use storage::WorkflowStore;

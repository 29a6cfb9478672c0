//! # Lifecycle State Machines
//!
//! Explicit transition tables per entity kind, and the checked pipeline that
//! applies an action to a record. The pipeline enforces, in order: the edge
//! exists (with the locked-entity guard), the actor is authorized, the
//! calendar window is open for submissions, and only then the status change
//! and reviewer stamps are applied.
//!
//! Revise actions are the single escape hatch out of a locked status and
//! always return the record to an editable state with its approval stamps
//! cleared.

use crate::actor::Actor;
use crate::authz::{can_perform, Action};
use crate::deadline;
use crate::error::WorkflowError;
use crate::model::{
    Assessment, AssessmentStatus, DataStatus, EntityRef, EvidenceDocument, PerformanceData, Target,
    TargetStatus,
};
use chrono::{DateTime, NaiveDate, Utc};

/// The clock and identity a transition runs under.
#[derive(Debug, Clone)]
pub struct TransitionCtx<'a> {
    pub actor: &'a Actor,
    /// Wall-clock date for the deadline gate.
    pub today: NaiveDate,
    /// Timestamp recorded in reviewer stamps.
    pub now: DateTime<Utc>,
}

impl<'a> TransitionCtx<'a> {
    #[must_use]
    pub fn new(actor: &'a Actor, now: DateTime<Utc>) -> Self {
        Self {
            actor,
            today: now.date_naive(),
            now,
        }
    }
}

// =============================================================================
// TRANSITION TABLES
// =============================================================================

/// Edge table for performance data and evidence documents.
#[must_use]
pub const fn data_transition(from: DataStatus, action: Action) -> Option<DataStatus> {
    use DataStatus as S;
    match (from, action) {
        (S::Draft, Action::DataSubmit | Action::EvidenceSubmit) => Some(S::Submitted),
        (S::Submitted, Action::DataValidate | Action::EvidenceValidate) => Some(S::Validated),
        (S::Submitted, Action::DataReject | Action::EvidenceReject) => Some(S::Rejected),
        (S::Validated, Action::DataAudit | Action::EvidenceAudit) => Some(S::Audited),
        (S::Validated | S::Audited, Action::DataRevise | Action::EvidenceRevise) => Some(S::Draft),
        _ => None,
    }
}

/// Edge table for yearly targets. Rejected is terminal; approved records
/// reopen only through the privileged revise edge.
#[must_use]
pub const fn target_transition(from: TargetStatus, action: Action) -> Option<TargetStatus> {
    use TargetStatus as S;
    match (from, action) {
        (S::Draft | S::Revised, Action::TargetSubmit) => Some(S::Submitted),
        (S::Submitted, Action::TargetApprove) => Some(S::Approved),
        (S::Submitted, Action::TargetReject) => Some(S::Rejected),
        (S::Approved, Action::TargetRevise) => Some(S::Revised),
        _ => None,
    }
}

/// Edge table for assessments.
#[must_use]
pub const fn assessment_transition(
    from: AssessmentStatus,
    action: Action,
) -> Option<AssessmentStatus> {
    use AssessmentStatus as S;
    match (from, action) {
        (S::Pending, Action::AssessmentReview) => Some(S::InReview),
        (S::InReview, Action::AssessmentComplete) => Some(S::Completed),
        (S::Completed, Action::AssessmentApprove) => Some(S::Approved),
        (S::Completed, Action::AssessmentReject) => Some(S::Rejected),
        (S::Approved, Action::AssessmentRevise) => Some(S::InReview),
        _ => None,
    }
}

// =============================================================================
// CHECKED PIPELINE
// =============================================================================

/// Resolve the edge, distinguishing a locked record from a plain illegal
/// transition when none exists.
fn resolve_edge<S: Copy>(
    from_label: &'static str,
    locked: bool,
    action: Action,
    edge: Option<S>,
) -> Result<S, WorkflowError> {
    match edge {
        Some(next) => Ok(next),
        None if locked && !action.is_revise() => Err(WorkflowError::LockedEntity {
            status: from_label.to_string(),
        }),
        None => Err(WorkflowError::IllegalTransition {
            from: from_label.to_string(),
            action: action.name().to_string(),
        }),
    }
}

fn authorize(actor: &Actor, action: Action, entity: &EntityRef) -> Result<(), WorkflowError> {
    if can_perform(actor, action, Some(entity)) {
        Ok(())
    } else {
        Err(WorkflowError::forbidden(action.name()))
    }
}

/// Apply an action to a performance-data record.
pub fn apply_data_action(
    data: &mut PerformanceData,
    action: Action,
    ctx: &TransitionCtx<'_>,
) -> Result<DataStatus, WorkflowError> {
    let next = resolve_edge(
        data.status.as_str(),
        data.status.is_locked(),
        action,
        data_transition(data.status, action),
    )?;
    authorize(ctx.actor, action, &data.entity_ref())?;
    if action.deadline_sensitive() {
        deadline::check_monthly_submission(ctx.actor, data.period, ctx.today)?;
    }

    match action {
        Action::DataSubmit => {
            data.submitted_by = Some(ctx.actor.user);
            data.submitted_at = Some(ctx.now);
        }
        Action::DataValidate | Action::DataReject => {
            data.validated_by = Some(ctx.actor.user);
            data.validated_at = Some(ctx.now);
        }
        Action::DataAudit => {
            data.audited_by = Some(ctx.actor.user);
            data.audited_at = Some(ctx.now);
        }
        Action::DataRevise => {
            data.submitted_by = None;
            data.submitted_at = None;
            data.validated_by = None;
            data.validated_at = None;
            data.audited_by = None;
            data.audited_at = None;
            data.validation_notes = None;
        }
        _ => {}
    }
    data.status = next;
    Ok(next)
}

/// Apply an action to a yearly target.
pub fn apply_target_action(
    target: &mut Target,
    action: Action,
    ctx: &TransitionCtx<'_>,
) -> Result<TargetStatus, WorkflowError> {
    let next = resolve_edge(
        target.status.as_str(),
        target.status.is_locked(),
        action,
        target_transition(target.status, action),
    )?;
    authorize(ctx.actor, action, &target.entity_ref())?;
    if action.deadline_sensitive() {
        deadline::check_target_submission(ctx.actor, ctx.today)?;
    }

    match action {
        Action::TargetSubmit => {
            target.submitted_by = Some(ctx.actor.user);
            target.submitted_at = Some(ctx.now);
        }
        Action::TargetApprove => {
            target.approved_by = Some(ctx.actor.user);
            target.approved_at = Some(ctx.now);
        }
        Action::TargetRevise => {
            target.submitted_by = None;
            target.submitted_at = None;
            target.approved_by = None;
            target.approved_at = None;
        }
        _ => {}
    }
    target.status = next;
    Ok(next)
}

/// Apply an action to an evidence document.
pub fn apply_evidence_action(
    evidence: &mut EvidenceDocument,
    action: Action,
    ctx: &TransitionCtx<'_>,
) -> Result<DataStatus, WorkflowError> {
    let next = resolve_edge(
        evidence.status.as_str(),
        evidence.status.is_locked(),
        action,
        data_transition(evidence.status, action),
    )?;
    authorize(ctx.actor, action, &evidence.entity_ref())?;

    match action {
        Action::EvidenceValidate | Action::EvidenceReject | Action::EvidenceAudit => {
            evidence.reviewed_by = Some(ctx.actor.user);
            evidence.reviewed_at = Some(ctx.now);
        }
        Action::EvidenceRevise => {
            evidence.reviewed_by = None;
            evidence.reviewed_at = None;
        }
        _ => {}
    }
    evidence.status = next;
    Ok(next)
}

/// Apply an action to an assessment.
pub fn apply_assessment_action(
    assessment: &mut Assessment,
    action: Action,
    ctx: &TransitionCtx<'_>,
) -> Result<AssessmentStatus, WorkflowError> {
    let next = resolve_edge(
        assessment.status.as_str(),
        assessment.status.is_locked(),
        action,
        assessment_transition(assessment.status, action),
    )?;
    authorize(ctx.actor, action, &assessment.entity_ref())?;

    match action {
        Action::AssessmentComplete => {
            assessment.assessed_at = Some(ctx.now);
        }
        Action::AssessmentApprove => {
            assessment.approved_by = Some(ctx.actor.user);
            assessment.approved_at = Some(ctx.now);
        }
        Action::AssessmentRevise => {
            assessment.approved_by = None;
            assessment.approved_at = None;
        }
        _ => {}
    }
    assessment.status = next;
    Ok(next)
}

// =============================================================================
// TESTS
// =============================================================================

//! # Authorization Rule Evaluator
//!
//! One generic `can_perform` over a declarative per-action rule table.
//! Rules are data: each action names its permission allow-list, the status
//! the target record must be in, and whether the record owner is required.
//! The evaluator is pure - same inputs, same answer, no side effects.
//!
//! Evaluation order:
//! 1. self-action guards (never deletable/impersonatable by yourself,
//!    superusers never impersonatable),
//! 2. superuser short-circuit,
//! 3. institution membership,
//! 4. required current status,
//! 5. ownership requirement,
//! 6. permission allow-list.

use crate::actor::{perm, Actor};
use crate::model::{EntityKind, EntityRef};
use serde::{Deserialize, Serialize};

// =============================================================================
// ACTIONS
// =============================================================================

/// Every named capability the engine authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // Performance data lifecycle
    DataSubmit,
    DataValidate,
    DataReject,
    DataAudit,
    DataRevise,
    // Target lifecycle
    TargetSubmit,
    TargetApprove,
    TargetReject,
    TargetRevise,
    // Evidence document lifecycle
    EvidenceSubmit,
    EvidenceValidate,
    EvidenceReject,
    EvidenceAudit,
    EvidenceRevise,
    // Assessment lifecycle
    AssessmentReview,
    AssessmentComplete,
    AssessmentApprove,
    AssessmentReject,
    AssessmentRevise,
    // Quarterly rollup
    QuarterlyCreate,
    // Account administration
    UserDelete,
    UserForceDelete,
    UserImpersonate,
}

/// The declarative rule for one action.
#[derive(Debug, Clone, Copy)]
pub struct ActionRule {
    /// Actor needs at least one of these permissions.
    pub allowed: &'static [&'static str],
    /// Target record must currently sit in one of these statuses
    /// (empty = any status, or no target record involved).
    pub required_status: &'static [&'static str],
    /// Non-privileged actors must own the record.
    pub owner_only: bool,
}

const fn rule(
    allowed: &'static [&'static str],
    required_status: &'static [&'static str],
    owner_only: bool,
) -> ActionRule {
    ActionRule {
        allowed,
        required_status,
        owner_only,
    }
}

impl Action {
    /// Stable dotted name used in audit entries and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DataSubmit => "performance_data.submit",
            Self::DataValidate => "performance_data.validate",
            Self::DataReject => "performance_data.reject",
            Self::DataAudit => "performance_data.audit",
            Self::DataRevise => "performance_data.revise",
            Self::TargetSubmit => "target.submit",
            Self::TargetApprove => "target.approve",
            Self::TargetReject => "target.reject",
            Self::TargetRevise => "target.revise",
            Self::EvidenceSubmit => "evidence_document.submit",
            Self::EvidenceValidate => "evidence_document.validate",
            Self::EvidenceReject => "evidence_document.reject",
            Self::EvidenceAudit => "evidence_document.audit",
            Self::EvidenceRevise => "evidence_document.revise",
            Self::AssessmentReview => "assessment.review",
            Self::AssessmentComplete => "assessment.complete",
            Self::AssessmentApprove => "assessment.approve",
            Self::AssessmentReject => "assessment.reject",
            Self::AssessmentRevise => "assessment.revise",
            Self::QuarterlyCreate => "quarterly_report.create",
            Self::UserDelete => "user.delete",
            Self::UserForceDelete => "user.force_delete",
            Self::UserImpersonate => "user.impersonate",
        }
    }

    /// The entity kind this action applies to.
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::DataSubmit
            | Self::DataValidate
            | Self::DataReject
            | Self::DataAudit
            | Self::DataRevise => EntityKind::PerformanceData,
            Self::TargetSubmit | Self::TargetApprove | Self::TargetReject | Self::TargetRevise => {
                EntityKind::Target
            }
            Self::EvidenceSubmit
            | Self::EvidenceValidate
            | Self::EvidenceReject
            | Self::EvidenceAudit
            | Self::EvidenceRevise => EntityKind::EvidenceDocument,
            Self::AssessmentReview
            | Self::AssessmentComplete
            | Self::AssessmentApprove
            | Self::AssessmentReject
            | Self::AssessmentRevise => EntityKind::Assessment,
            Self::QuarterlyCreate => EntityKind::QuarterlyReport,
            Self::UserDelete | Self::UserForceDelete | Self::UserImpersonate => EntityKind::User,
        }
    }

    /// Submissions are gated by the deadline windows; everything else is
    /// not time-sensitive.
    #[must_use]
    pub const fn deadline_sensitive(self) -> bool {
        matches!(self, Self::DataSubmit | Self::TargetSubmit)
    }

    /// Revise actions reopen terminal-locked records and are exempt from
    /// the locked-entity guard.
    #[must_use]
    pub const fn is_revise(self) -> bool {
        matches!(
            self,
            Self::DataRevise | Self::TargetRevise | Self::EvidenceRevise | Self::AssessmentRevise
        )
    }

    /// Resolve an action from an entity kind and a verb, as received from
    /// the request layer.
    #[must_use]
    pub fn parse(kind: EntityKind, verb: &str) -> Option<Self> {
        let action = match (kind, verb) {
            (EntityKind::PerformanceData, "submit") => Self::DataSubmit,
            (EntityKind::PerformanceData, "validate") => Self::DataValidate,
            (EntityKind::PerformanceData, "reject") => Self::DataReject,
            (EntityKind::PerformanceData, "audit") => Self::DataAudit,
            (EntityKind::PerformanceData, "revise") => Self::DataRevise,
            (EntityKind::Target, "submit") => Self::TargetSubmit,
            (EntityKind::Target, "approve") => Self::TargetApprove,
            (EntityKind::Target, "reject") => Self::TargetReject,
            (EntityKind::Target, "revise") => Self::TargetRevise,
            (EntityKind::EvidenceDocument, "submit") => Self::EvidenceSubmit,
            (EntityKind::EvidenceDocument, "validate") => Self::EvidenceValidate,
            (EntityKind::EvidenceDocument, "reject") => Self::EvidenceReject,
            (EntityKind::EvidenceDocument, "audit") => Self::EvidenceAudit,
            (EntityKind::EvidenceDocument, "revise") => Self::EvidenceRevise,
            (EntityKind::Assessment, "review") => Self::AssessmentReview,
            (EntityKind::Assessment, "complete") => Self::AssessmentComplete,
            (EntityKind::Assessment, "approve") => Self::AssessmentApprove,
            (EntityKind::Assessment, "reject") => Self::AssessmentReject,
            (EntityKind::Assessment, "revise") => Self::AssessmentRevise,
            (EntityKind::QuarterlyReport, "create") => Self::QuarterlyCreate,
            (EntityKind::User, "delete") => Self::UserDelete,
            (EntityKind::User, "force_delete") => Self::UserForceDelete,
            (EntityKind::User, "impersonate") => Self::UserImpersonate,
            _ => return None,
        };
        Some(action)
    }

    /// The declarative rule for this action.
    #[must_use]
    pub const fn rule(self) -> ActionRule {
        match self {
            Self::DataSubmit => rule(
                &[perm::DATA_SUBMIT, perm::ADMIN, perm::PIMPINAN],
                &["draft"],
                true,
            ),
            Self::DataValidate => rule(
                &[perm::DATA_VALIDATE, perm::ADMIN, perm::PIMPINAN],
                &["submitted"],
                false,
            ),
            Self::DataReject => rule(
                &[perm::DATA_VALIDATE, perm::ADMIN, perm::PIMPINAN],
                &["submitted"],
                false,
            ),
            Self::DataAudit => rule(
                &[perm::AUDITOR, perm::ADMIN, perm::PIMPINAN],
                &["validated"],
                false,
            ),
            Self::DataRevise => rule(&[perm::ADMIN], &["validated", "audited"], false),
            Self::TargetSubmit => rule(
                &[perm::TARGET_SUBMIT, perm::ADMIN, perm::PIMPINAN],
                &["draft", "revised"],
                false,
            ),
            Self::TargetApprove => rule(&[perm::PIMPINAN, perm::ADMIN], &["submitted"], false),
            Self::TargetReject => rule(&[perm::PIMPINAN, perm::ADMIN], &["submitted"], false),
            Self::TargetRevise => rule(&[perm::ADMIN], &["approved"], false),
            Self::EvidenceSubmit => rule(
                &[perm::DATA_SUBMIT, perm::ADMIN, perm::PIMPINAN],
                &["draft"],
                true,
            ),
            Self::EvidenceValidate => rule(
                &[perm::DATA_VALIDATE, perm::ADMIN, perm::PIMPINAN],
                &["submitted"],
                false,
            ),
            Self::EvidenceReject => rule(
                &[perm::DATA_VALIDATE, perm::ADMIN, perm::PIMPINAN],
                &["submitted"],
                false,
            ),
            Self::EvidenceAudit => rule(
                &[perm::AUDITOR, perm::ADMIN, perm::PIMPINAN],
                &["validated"],
                false,
            ),
            Self::EvidenceRevise => rule(&[perm::ADMIN], &["validated", "audited"], false),
            Self::AssessmentReview => rule(&[perm::PIMPINAN, perm::ADMIN], &["pending"], false),
            Self::AssessmentComplete => rule(
                &[perm::ASSESSOR, perm::ADMIN, perm::PIMPINAN],
                &["in_review"],
                true,
            ),
            Self::AssessmentApprove => rule(&[perm::PIMPINAN, perm::ADMIN], &["completed"], false),
            Self::AssessmentReject => rule(&[perm::PIMPINAN, perm::ADMIN], &["completed"], false),
            Self::AssessmentRevise => rule(&[perm::ADMIN], &["approved"], false),
            Self::QuarterlyCreate => rule(&[perm::PIMPINAN, perm::ADMIN], &[], false),
            Self::UserDelete => rule(&[perm::USER_DELETE, perm::ADMIN], &[], false),
            Self::UserForceDelete => rule(&[perm::USER_FORCE_DELETE, perm::ADMIN], &[], false),
            Self::UserImpersonate => rule(&[perm::USER_IMPERSONATE, perm::ADMIN], &[], false),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// EVALUATOR
// =============================================================================

/// Decide whether `actor` may perform `action`, optionally against a
/// specific target record.
#[must_use]
pub fn can_perform(actor: &Actor, action: Action, entity: Option<&EntityRef>) -> bool {
    // Self-action guards come before the superuser bypass: nobody deletes
    // their own account or impersonates themselves / a superuser.
    if let Some(entity) = entity {
        match action {
            Action::UserDelete | Action::UserForceDelete => {
                if entity.owner == Some(actor.user) {
                    return false;
                }
            }
            Action::UserImpersonate => {
                if entity.owner == Some(actor.user) || entity.target_is_superuser {
                    return false;
                }
            }
            _ => {}
        }
    }

    if actor.superuser {
        return true;
    }

    let rule = action.rule();

    if let Some(entity) = entity {
        // Institution scope: acting across institutions is denied
        // regardless of role.
        if let Some(instansi) = entity.instansi {
            if !actor.belongs_to(instansi) {
                return false;
            }
        }

        // Required current status.
        if !rule.required_status.is_empty() && !rule.required_status.contains(&entity.status) {
            return false;
        }

        // Ownership: non-privileged actors may only act on their own
        // records for owner-scoped actions.
        if rule.owner_only
            && !actor.has_any_permission(&[perm::ADMIN, perm::PIMPINAN])
            && entity.owner != Some(actor.user)
        {
            return false;
        }
    }

    actor.has_any_permission(rule.allowed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{InstansiId, UserId};

    fn data_ref(instansi: u64, status: &'static str, owner: u64) -> EntityRef {
        EntityRef {
            kind: EntityKind::PerformanceData,
            id: 1,
            instansi: Some(InstansiId(instansi)),
            status,
            owner: Some(UserId(owner)),
            target_is_superuser: false,
        }
    }

    #[test]
    fn superuser_bypasses_everything() {
        let root = Actor::superuser(UserId(1));
        let foreign = data_ref(99, "submitted", 7);
        assert!(can_perform(&root, Action::DataValidate, Some(&foreign)));
        assert!(can_perform(&root, Action::DataRevise, Some(&foreign)));
    }

    #[test]
    fn cross_institution_is_denied_regardless_of_role() {
        let validator = Actor::new(UserId(1), InstansiId(10), [perm::DATA_VALIDATE, perm::ADMIN]);
        let foreign = data_ref(11, "submitted", 7);
        assert!(!can_perform(&validator, Action::DataValidate, Some(&foreign)));
    }

    #[test]
    fn status_must_match_the_rule() {
        let validator = Actor::new(UserId(1), InstansiId(10), [perm::DATA_VALIDATE]);
        let draft = data_ref(10, "draft", 7);
        let submitted = data_ref(10, "submitted", 7);
        assert!(!can_perform(&validator, Action::DataValidate, Some(&draft)));
        assert!(can_perform(&validator, Action::DataValidate, Some(&submitted)));
    }

    #[test]
    fn allow_list_requires_at_least_one_permission() {
        let bystander = Actor::new(UserId(1), InstansiId(10), [perm::ASSESSOR]);
        let submitted = data_ref(10, "submitted", 7);
        assert!(!can_perform(&bystander, Action::DataValidate, Some(&submitted)));

        let pimpinan = Actor::new(UserId(2), InstansiId(10), [perm::PIMPINAN]);
        assert!(can_perform(&pimpinan, Action::DataValidate, Some(&submitted)));
    }

    #[test]
    fn owner_scoped_submit() {
        let clerk = Actor::new(UserId(7), InstansiId(10), [perm::DATA_SUBMIT]);
        let own = data_ref(10, "draft", 7);
        let other = data_ref(10, "draft", 8);
        assert!(can_perform(&clerk, Action::DataSubmit, Some(&own)));
        assert!(!can_perform(&clerk, Action::DataSubmit, Some(&other)));

        // Pimpinan is not owner-scoped.
        let pimpinan = Actor::new(UserId(9), InstansiId(10), [perm::PIMPINAN]);
        assert!(can_perform(&pimpinan, Action::DataSubmit, Some(&other)));
    }

    #[test]
    fn self_delete_is_never_allowed() {
        let mut own_account = EntityRef::new(EntityKind::User, 1);
        own_account.owner = Some(UserId(1));

        let admin = Actor::new(UserId(1), InstansiId(10), [perm::ADMIN]);
        assert!(!can_perform(&admin, Action::UserDelete, Some(&own_account)));
        assert!(!can_perform(&admin, Action::UserForceDelete, Some(&own_account)));

        // Even superusers cannot delete themselves.
        let root = Actor::superuser(UserId(1));
        assert!(!can_perform(&root, Action::UserDelete, Some(&own_account)));
    }

    #[test]
    fn impersonation_guards() {
        let admin = Actor::new(UserId(1), InstansiId(10), [perm::USER_IMPERSONATE]);

        let mut themselves = EntityRef::new(EntityKind::User, 1);
        themselves.owner = Some(UserId(1));
        assert!(!can_perform(&admin, Action::UserImpersonate, Some(&themselves)));

        let mut root_account = EntityRef::new(EntityKind::User, 2);
        root_account.owner = Some(UserId(2));
        root_account.target_is_superuser = true;
        assert!(!can_perform(&admin, Action::UserImpersonate, Some(&root_account)));

        let mut colleague = EntityRef::new(EntityKind::User, 3);
        colleague.owner = Some(UserId(3));
        assert!(can_perform(&admin, Action::UserImpersonate, Some(&colleague)));
    }

    #[test]
    fn quarterly_create_is_leadership_scoped() {
        let rollup = EntityRef {
            kind: EntityKind::QuarterlyReport,
            id: 1,
            instansi: Some(InstansiId(10)),
            status: "",
            owner: None,
            target_is_superuser: false,
        };

        let pimpinan = Actor::new(UserId(1), InstansiId(10), [perm::PIMPINAN]);
        assert!(can_perform(&pimpinan, Action::QuarterlyCreate, Some(&rollup)));

        let clerk = Actor::new(UserId(2), InstansiId(10), [perm::DATA_SUBMIT]);
        assert!(!can_perform(&clerk, Action::QuarterlyCreate, Some(&rollup)));

        // Leadership of another institution is still out of scope.
        let foreign = Actor::new(UserId(3), InstansiId(11), [perm::PIMPINAN]);
        assert!(!can_perform(&foreign, Action::QuarterlyCreate, Some(&rollup)));
    }

    #[test]
    fn evaluation_is_pure() {
        let actor = Actor::new(UserId(1), InstansiId(10), [perm::DATA_VALIDATE]);
        let entity = data_ref(10, "submitted", 7);
        let first = can_perform(&actor, Action::DataValidate, Some(&entity));
        let second = can_perform(&actor, Action::DataValidate, Some(&entity));
        assert_eq!(first, second);
    }

    #[test]
    fn parse_resolves_kind_and_verb() {
        assert_eq!(
            Action::parse(EntityKind::PerformanceData, "validate"),
            Some(Action::DataValidate)
        );
        assert_eq!(
            Action::parse(EntityKind::Assessment, "complete"),
            Some(Action::AssessmentComplete)
        );
        assert_eq!(Action::parse(EntityKind::Target, "validate"), None);
    }
}

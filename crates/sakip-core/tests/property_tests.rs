//! Property tests for the pure evaluators: authorization, transition
//! tables, and fixed-point arithmetic.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use proptest::prelude::*;
use sakip_core::lifecycle::{assessment_transition, data_transition, target_transition};
use sakip_core::{
    can_perform, perm, Action, Actor, AssessmentStatus, DataStatus, Decimal2, EntityKind,
    EntityRef, InstansiId, TargetStatus, UserId,
};

// =============================================================================
// STRATEGIES
// =============================================================================

fn arb_permissions() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::collection::vec(
        prop_oneof![
            Just(perm::ADMIN),
            Just(perm::PIMPINAN),
            Just(perm::ASSESSOR),
            Just(perm::AUDITOR),
            Just(perm::DATA_SUBMIT),
            Just(perm::DATA_VALIDATE),
            Just(perm::TARGET_SUBMIT),
        ],
        0..4,
    )
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::DataSubmit),
        Just(Action::DataValidate),
        Just(Action::DataReject),
        Just(Action::DataAudit),
        Just(Action::DataRevise),
        Just(Action::TargetSubmit),
        Just(Action::TargetApprove),
        Just(Action::TargetReject),
        Just(Action::TargetRevise),
        Just(Action::AssessmentReview),
        Just(Action::AssessmentComplete),
        Just(Action::AssessmentApprove),
        Just(Action::AssessmentReject),
        Just(Action::AssessmentRevise),
    ]
}

fn arb_data_status() -> impl Strategy<Value = DataStatus> {
    prop_oneof![
        Just(DataStatus::Draft),
        Just(DataStatus::Submitted),
        Just(DataStatus::Validated),
        Just(DataStatus::Rejected),
        Just(DataStatus::Audited),
    ]
}

fn arb_status_label() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("draft"),
        Just("submitted"),
        Just("validated"),
        Just("rejected"),
        Just("audited"),
        Just("pending"),
        Just("in_review"),
        Just("completed"),
        Just("approved"),
        Just("revised"),
    ]
}

// =============================================================================
// AUTHORIZATION
// =============================================================================

proptest! {
    /// A non-superuser acting across institutions is always denied,
    /// whatever permissions they hold.
    #[test]
    fn cross_institution_is_always_denied(
        perms in arb_permissions(),
        action in arb_action(),
        status in arb_status_label(),
        actor_inst in 1u64..100,
        offset in 1u64..100,
    ) {
        let actor = Actor::new(UserId(1), InstansiId(actor_inst), perms);
        let entity = EntityRef {
            kind: action.kind(),
            id: 7,
            instansi: Some(InstansiId(actor_inst + offset)),
            status,
            owner: Some(UserId(2)),
            target_is_superuser: false,
        };
        prop_assert!(!can_perform(&actor, action, Some(&entity)));
    }

    /// The evaluator is a pure function of its inputs.
    #[test]
    fn can_perform_is_deterministic(
        perms in arb_permissions(),
        action in arb_action(),
        status in arb_status_label(),
        inst in 1u64..100,
    ) {
        let actor = Actor::new(UserId(1), InstansiId(inst), perms);
        let entity = EntityRef {
            kind: action.kind(),
            id: 7,
            instansi: Some(InstansiId(inst)),
            status,
            owner: Some(UserId(1)),
            target_is_superuser: false,
        };
        let first = can_perform(&actor, action, Some(&entity));
        let second = can_perform(&actor, action, Some(&entity));
        prop_assert_eq!(first, second);
    }

    /// An actor with no permissions can do nothing.
    #[test]
    fn empty_permission_set_is_denied(
        action in arb_action(),
        status in arb_status_label(),
    ) {
        let actor = Actor::new(UserId(1), InstansiId(10), Vec::<String>::new());
        let entity = EntityRef {
            kind: action.kind(),
            id: 7,
            instansi: Some(InstansiId(10)),
            status,
            owner: Some(UserId(1)),
            target_is_superuser: false,
        };
        prop_assert!(!can_perform(&actor, action, Some(&entity)));
    }
}

// =============================================================================
// TRANSITION TABLES
// =============================================================================

proptest! {
    /// Edges only ever leave unlocked statuses, except the revise escape
    /// hatch and the audit edge out of validated.
    #[test]
    fn data_edges_respect_the_lock(from in arb_data_status(), action in arb_action()) {
        if let Some(_next) = data_transition(from, action) {
            if from.is_locked() {
                prop_assert!(
                    action == Action::DataRevise || action == Action::DataAudit,
                    "unexpected edge out of locked {:?} via {:?}", from, action
                );
            }
        }
    }
}

/// Every reachable status is in the declared set, from every start.
#[test]
fn data_graph_is_closed_under_reachability() {
    let statuses = [
        DataStatus::Draft,
        DataStatus::Submitted,
        DataStatus::Validated,
        DataStatus::Rejected,
        DataStatus::Audited,
    ];
    let actions = [
        Action::DataSubmit,
        Action::DataValidate,
        Action::DataReject,
        Action::DataAudit,
        Action::DataRevise,
    ];
    let mut frontier: Vec<DataStatus> = vec![DataStatus::Draft];
    let mut seen = vec![DataStatus::Draft];
    while let Some(status) = frontier.pop() {
        for action in actions {
            if let Some(next) = data_transition(status, action) {
                assert!(statuses.contains(&next));
                if !seen.contains(&next) {
                    seen.push(next);
                    frontier.push(next);
                }
            }
        }
    }
    // From draft everything except nothing is reachable.
    assert_eq!(seen.len(), 5);
}

#[test]
fn target_and_assessment_terminal_states() {
    let target_actions = [
        Action::TargetSubmit,
        Action::TargetApprove,
        Action::TargetReject,
        Action::TargetRevise,
    ];
    for action in target_actions {
        assert_eq!(target_transition(TargetStatus::Rejected, action), None);
    }

    let assessment_actions = [
        Action::AssessmentReview,
        Action::AssessmentComplete,
        Action::AssessmentApprove,
        Action::AssessmentReject,
        Action::AssessmentRevise,
    ];
    for action in assessment_actions {
        assert_eq!(assessment_transition(AssessmentStatus::Rejected, action), None);
    }
}

// =============================================================================
// FIXED-POINT ARITHMETIC
// =============================================================================

proptest! {
    /// Display/parse is a lossless round trip.
    #[test]
    fn decimal_display_parse_roundtrip(hundredths in -1_000_000_000i64..1_000_000_000) {
        let value = Decimal2::from_hundredths(hundredths);
        let parsed: Decimal2 = value.to_string().parse().unwrap();
        prop_assert_eq!(parsed, value);
    }

    /// A weighted mean with positive weights stays within the value range.
    #[test]
    fn weighted_mean_is_bounded(
        values in proptest::collection::vec((0i64..=100, 1i64..=10), 1..6),
    ) {
        let pairs: Vec<(Decimal2, Decimal2)> = values
            .iter()
            .map(|&(v, w)| (Decimal2::from_int(v), Decimal2::from_int(w)))
            .collect();
        let mean = Decimal2::weighted_mean(&pairs).unwrap();
        let lo = pairs.iter().map(|(v, _)| *v).min().unwrap();
        let hi = pairs.iter().map(|(v, _)| *v).max().unwrap();
        prop_assert!(mean >= lo && mean <= hi);
    }

    /// `percent_of` against the value itself is exactly 100.00.
    #[test]
    fn percent_of_self_is_one_hundred(value in 1i64..1_000_000) {
        let value = Decimal2::from_int(value);
        prop_assert_eq!(value.percent_of(value), Decimal2::ONE_HUNDRED);
    }
}

// The EntityKind label set is stable; the authorization table keys on it.
#[test]
fn entity_kind_labels_are_stable() {
    assert_eq!(EntityKind::PerformanceData.label(), "performance_data");
    assert_eq!(EntityKind::QuarterlyReport.label(), "quarterly_report");
}

//! # Workflow Engine
//!
//! The facade the request layer talks to. Wires the pure evaluators
//! (authorization, lifecycle, deadline, aggregation, scoring, achievement)
//! to the record store and the audit trail. Time always enters through the
//! caller; the engine never reads a global clock.

use crate::achievement::{achievement, Achievement};
use crate::actor::Actor;
use crate::aggregate::aggregate_quarter;
use crate::audit::AuditEntry;
use crate::authz::{can_perform, Action};
use crate::decimal::Decimal2;
use crate::error::WorkflowError;
use crate::ids::{AssessmentId, DataId, EvidenceId, IndicatorId, InstansiId, TargetId};
use crate::lifecycle::{
    apply_assessment_action, apply_data_action, apply_evidence_action, apply_target_action,
    TransitionCtx,
};
use crate::model::{
    Assessment, EntityKind, EntityRef, EvidenceDocument, PerformanceData, QuarterlyReport, Target,
};
use crate::period::Quarter;
use crate::storage::WorkflowStore;
use chrono::{DateTime, Utc};
use std::path::Path;

/// The workflow engine over one record store.
pub struct WorkflowEngine {
    store: WorkflowStore,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(store: WorkflowStore) -> Self {
        Self { store }
    }

    /// Open the store at `path` and build an engine over it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        Ok(Self::new(WorkflowStore::open(path)?))
    }

    /// Direct access to the record store.
    #[must_use]
    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    /// Pure authorization check; no side effects.
    #[must_use]
    pub fn can_perform(&self, actor: &Actor, action: Action, entity: Option<&EntityRef>) -> bool {
        can_perform(actor, action, entity)
    }

    /// Pure achievement computation.
    #[must_use]
    pub fn achievement(
        &self,
        actual: Decimal2,
        target: Option<Decimal2>,
        minimum: Option<Decimal2>,
    ) -> Achievement {
        achievement(actual, target, minimum)
    }

    fn transition_entry(
        actor: &Actor,
        action: Action,
        kind: EntityKind,
        entity_id: u64,
        before: &str,
        after: &str,
        at: DateTime<Utc>,
    ) -> AuditEntry {
        AuditEntry::new(actor.user, action.name(), kind, entity_id, at)
            .with_states(Some(before), Some(after))
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Apply a lifecycle action to a performance-data record and persist
    /// the outcome. Submission stamps the achievement percentage against
    /// the indicator's yearly target.
    pub fn transition_data(
        &self,
        actor: &Actor,
        id: DataId,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<PerformanceData, WorkflowError> {
        let mut data = self.store.get_data(id)?;
        let before = data.status.as_str();
        let ctx = TransitionCtx::new(actor, now);
        apply_data_action(&mut data, action, &ctx)?;

        if action == Action::DataSubmit {
            let target = self.store.target_for_year(data.indicator, data.period.year)?;
            let result = achievement(
                data.actual_value,
                target.as_ref().map(|t| t.target_value),
                target.as_ref().and_then(|t| t.minimum_value),
            );
            data.persentase_capaian = Some(result.percentage);
        }

        // Record and trail entry land in one transaction; a crash cannot
        // leave an unaudited state change behind.
        let entry = Self::transition_entry(
            actor,
            action,
            EntityKind::PerformanceData,
            data.id.0,
            before,
            data.status.as_str(),
            now,
        );
        self.store.put_data_with_audit(&data, &entry)?;
        Ok(data)
    }

    /// Apply a lifecycle action to a yearly target and persist the outcome.
    pub fn transition_target(
        &self,
        actor: &Actor,
        id: TargetId,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<Target, WorkflowError> {
        let mut target = self.store.get_target(id)?;
        let before = target.status.as_str();
        let ctx = TransitionCtx::new(actor, now);
        apply_target_action(&mut target, action, &ctx)?;
        let entry = Self::transition_entry(
            actor,
            action,
            EntityKind::Target,
            target.id.0,
            before,
            target.status.as_str(),
            now,
        );
        self.store.put_target_with_audit(&target, &entry)?;
        Ok(target)
    }

    /// Apply a lifecycle action to an evidence document and persist the
    /// outcome.
    pub fn transition_evidence(
        &self,
        actor: &Actor,
        id: EvidenceId,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<EvidenceDocument, WorkflowError> {
        let mut evidence = self.store.get_evidence(id)?;
        let before = evidence.status.as_str();
        let ctx = TransitionCtx::new(actor, now);
        apply_evidence_action(&mut evidence, action, &ctx)?;
        let entry = Self::transition_entry(
            actor,
            action,
            EntityKind::EvidenceDocument,
            evidence.id.0,
            before,
            evidence.status.as_str(),
            now,
        );
        self.store.put_evidence_with_audit(&evidence, &entry)?;
        Ok(evidence)
    }

    /// Apply a lifecycle action to an assessment and persist the outcome.
    pub fn transition_assessment(
        &self,
        actor: &Actor,
        id: AssessmentId,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<Assessment, WorkflowError> {
        let mut assessment = self.store.get_assessment(id)?;
        let before = assessment.status.as_str();
        let ctx = TransitionCtx::new(actor, now);
        apply_assessment_action(&mut assessment, action, &ctx)?;
        let entry = Self::transition_entry(
            actor,
            action,
            EntityKind::Assessment,
            assessment.id.0,
            before,
            assessment.status.as_str(),
            now,
        );
        self.store.put_assessment_with_audit(&assessment, &entry)?;
        Ok(assessment)
    }

    // =========================================================================
    // AGGREGATION AND SCORING
    // =========================================================================

    /// Roll the stored monthly records of `(indicator, year, quarter)` up
    /// into a persisted draft quarterly report.
    pub fn aggregate_quarter(
        &self,
        actor: &Actor,
        indicator: IndicatorId,
        instansi: InstansiId,
        year: i32,
        quarter: Quarter,
        now: DateTime<Utc>,
    ) -> Result<QuarterlyReport, WorkflowError> {
        // Rollups are leadership work, scoped to the actor's institution.
        let scope = EntityRef {
            kind: EntityKind::QuarterlyReport,
            id: indicator.0,
            instansi: Some(instansi),
            status: "",
            owner: None,
            target_is_superuser: false,
        };
        if !can_perform(actor, Action::QuarterlyCreate, Some(&scope)) {
            return Err(WorkflowError::forbidden(Action::QuarterlyCreate.name()));
        }

        let monthly = self.store.data_for_year(indicator, instansi, year)?;
        let report = aggregate_quarter(indicator, instansi, year, quarter, &monthly)?;
        let entry = AuditEntry::new(
            actor.user,
            Action::QuarterlyCreate.name(),
            EntityKind::QuarterlyReport,
            indicator.0,
            now,
        )
        .with_states(None::<String>, Some(report.status.as_str()));
        self.store.create_quarterly_with_audit(&report, &entry)?;
        Ok(report)
    }

    /// Recompute and persist an assessment's overall score from its stored
    /// criteria.
    pub fn recompute_assessment_score(
        &self,
        id: AssessmentId,
    ) -> Result<Option<Decimal2>, WorkflowError> {
        self.store.recompute_assessment_score(id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::perm;
    use crate::ids::UserId;
    use crate::model::DataStatus;
    use crate::period::{Month, ReportPeriod};
    use chrono::TimeZone;

    fn engine() -> (tempfile::TempDir, WorkflowEngine) {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = WorkflowEngine::open(dir.path().join("sakip.redb")).expect("open");
        (dir, engine)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).single().expect("valid")
    }

    fn seed_data(engine: &WorkflowEngine, month: Month, actual: i64) -> PerformanceData {
        engine
            .store()
            .create_data(PerformanceData {
                id: DataId(0),
                indicator: IndicatorId(1),
                instansi: InstansiId(10),
                period: ReportPeriod::new(2025, month),
                actual_value: Decimal2::from_int(actual),
                persentase_capaian: None,
                kendala: None,
                tindak_lanjut: None,
                status: DataStatus::Draft,
                data_quality: None,
                created_by: UserId(3),
                submitted_by: None,
                submitted_at: None,
                validation_notes: None,
                validated_by: None,
                validated_at: None,
                audited_by: None,
                audited_at: None,
            })
            .expect("create data")
    }

    #[test]
    fn submission_stamps_achievement_against_the_yearly_target() {
        let (_dir, engine) = engine();
        engine
            .store()
            .create_target(
                IndicatorId(1),
                InstansiId(10),
                2025,
                Decimal2::from_int(100),
                Some(Decimal2::from_int(70)),
                UserId(3),
            )
            .expect("target");
        let data = seed_data(&engine, Month::January, 80);

        let clerk = Actor::new(UserId(3), InstansiId(10), [perm::DATA_SUBMIT]);
        let updated = engine
            .transition_data(&clerk, data.id, Action::DataSubmit, now())
            .expect("submit");
        assert_eq!(updated.status, DataStatus::Submitted);
        assert_eq!(updated.persentase_capaian, Some(Decimal2::from_int(80)));

        // February measures against the same yearly target.
        let other = seed_data(&engine, Month::February, 50);
        let updated = engine
            .transition_data(&clerk, other.id, Action::DataSubmit, now())
            .expect("submit");
        assert_eq!(updated.persentase_capaian, Some(Decimal2::from_int(50)));
    }

    #[test]
    fn transitions_are_persisted_and_audited() {
        let (_dir, engine) = engine();
        let data = seed_data(&engine, Month::January, 80);
        let clerk = Actor::new(UserId(3), InstansiId(10), [perm::DATA_SUBMIT]);
        let validator = Actor::new(UserId(4), InstansiId(10), [perm::DATA_VALIDATE]);

        engine
            .transition_data(&clerk, data.id, Action::DataSubmit, now())
            .expect("submit");
        engine
            .transition_data(&validator, data.id, Action::DataValidate, now())
            .expect("validate");

        let stored = engine.store().get_data(data.id).expect("get");
        assert_eq!(stored.status, DataStatus::Validated);
        assert_eq!(stored.validated_by, Some(UserId(4)));

        let trail = engine.store().audit_entries().expect("audit");
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, "performance_data.submit");
        assert_eq!(trail[0].before.as_deref(), Some("draft"));
        assert_eq!(trail[0].after.as_deref(), Some("submitted"));
        assert_eq!(trail[1].action, "performance_data.validate");
        assert_eq!(trail[1].actor, UserId(4));
    }

    #[test]
    fn failed_transition_leaves_no_trace() {
        let (_dir, engine) = engine();
        let data = seed_data(&engine, Month::January, 80);
        let stranger = Actor::new(UserId(8), InstansiId(11), [perm::DATA_SUBMIT]);

        let denied = engine.transition_data(&stranger, data.id, Action::DataSubmit, now());
        assert!(matches!(denied, Err(WorkflowError::Forbidden { .. })));

        let stored = engine.store().get_data(data.id).expect("get");
        assert_eq!(stored.status, DataStatus::Draft);
        assert!(engine.store().audit_entries().expect("audit").is_empty());
    }

    #[test]
    fn quarter_rollup_end_to_end() {
        let (_dir, engine) = engine();
        let admin = Actor::new(UserId(9), InstansiId(10), [perm::ADMIN]);
        for (month, actual) in [(Month::January, 100), (Month::February, 80), (Month::March, 90)] {
            let data = seed_data(&engine, month, actual);
            engine
                .transition_data(&admin, data.id, Action::DataSubmit, now())
                .expect("submit");
        }
        // Targets absent: stamped percentages are zero, the mean still forms.
        let report = engine
            .aggregate_quarter(&admin, IndicatorId(1), InstansiId(10), 2025, Quarter::Q1, now())
            .expect("rollup");
        assert_eq!(report.nilai_realisasi, Decimal2::from_int(270));
        assert_eq!(report.status, DataStatus::Draft);

        // The slot is now occupied.
        let second = engine.aggregate_quarter(
            &admin,
            IndicatorId(1),
            InstansiId(10),
            2025,
            Quarter::Q1,
            now(),
        );
        assert!(matches!(second, Err(WorkflowError::DuplicateRecord { .. })));

        // An empty quarter refuses to aggregate.
        let empty = engine.aggregate_quarter(
            &admin,
            IndicatorId(1),
            InstansiId(10),
            2025,
            Quarter::Q3,
            now(),
        );
        assert_eq!(empty, Err(WorkflowError::NoData));
    }

    #[test]
    fn rollup_is_denied_outside_leadership() {
        let (_dir, engine) = engine();
        let admin = Actor::new(UserId(9), InstansiId(10), [perm::ADMIN]);
        let data = seed_data(&engine, Month::January, 100);
        engine
            .transition_data(&admin, data.id, Action::DataSubmit, now())
            .expect("submit");
        let trail_before = engine.store().audit_entries().expect("audit").len();

        // A data clerk cannot roll up, even inside their own institution.
        let clerk = Actor::new(UserId(3), InstansiId(10), [perm::DATA_SUBMIT]);
        let denied =
            engine.aggregate_quarter(&clerk, IndicatorId(1), InstansiId(10), 2025, Quarter::Q1, now());
        assert!(matches!(denied, Err(WorkflowError::Forbidden { .. })));

        // Leadership of another institution is out of scope.
        let outsider = Actor::new(UserId(5), InstansiId(11), [perm::PIMPINAN]);
        let denied = engine.aggregate_quarter(
            &outsider,
            IndicatorId(1),
            InstansiId(10),
            2025,
            Quarter::Q1,
            now(),
        );
        assert!(matches!(denied, Err(WorkflowError::Forbidden { .. })));

        // Nothing was persisted by the denied attempts.
        assert_eq!(engine.store().audit_entries().expect("audit").len(), trail_before);

        // Leadership in the right institution succeeds, proving the slot
        // stayed free.
        let pimpinan = Actor::new(UserId(5), InstansiId(10), [perm::PIMPINAN]);
        engine
            .aggregate_quarter(&pimpinan, IndicatorId(1), InstansiId(10), 2025, Quarter::Q1, now())
            .expect("rollup");
    }

    #[test]
    fn recompute_score_round_trip() {
        let (_dir, engine) = engine();
        let data = seed_data(&engine, Month::January, 80);
        let assessment = engine
            .store()
            .create_assessment(data.id, data.instansi, UserId(6))
            .expect("assessment");

        assert_eq!(engine.recompute_assessment_score(assessment.id), Ok(None));

        engine
            .store()
            .upsert_criterion(crate::model::AssessmentCriterion {
                id: crate::ids::CriterionId(0),
                assessment: assessment.id,
                name: "completeness".into(),
                score: Decimal2::from_int(90),
                weight: Decimal2::from_int(2),
                justification: None,
            })
            .expect("criterion");

        assert_eq!(
            engine.recompute_assessment_score(assessment.id),
            Ok(Some(Decimal2::from_int(90)))
        );
    }
}

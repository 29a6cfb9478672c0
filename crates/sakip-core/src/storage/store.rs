//! Record tables, unique indexes, and deletion policies over one redb file.
//!
//! Every entity kind gets a primary table keyed by id with postcard-encoded
//! values. Uniqueness constraints are separate index tables with composite
//! keys; the check-then-insert runs inside the single write transaction, so
//! the race window the application-level pre-check would leave is closed by
//! redb's single-writer model.

use crate::audit::{AuditEntry, AuditSink};
use crate::decimal::Decimal2;
use crate::error::WorkflowError;
use crate::ids::{
    AssessmentId, CriterionId, DataId, EvidenceId, IndicatorId, InstansiId, TargetId, UserId,
};
use crate::model::{
    Assessment, AssessmentCriterion, EvidenceDocument, Instansi, PerformanceData,
    PerformanceIndicator, QuarterlyReport, Target, UserRecord,
};
use crate::period::Quarter;
use crate::scoring::compute_overall_score;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

// =============================================================================
// TABLES
// =============================================================================

/// Monotonic id sequences, one per entity kind.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

const INSTANSI: TableDefinition<u64, &[u8]> = TableDefinition::new("instansi");
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
const INDICATORS: TableDefinition<u64, &[u8]> = TableDefinition::new("indicators");
const TARGETS: TableDefinition<u64, &[u8]> = TableDefinition::new("targets");
const DATA: TableDefinition<u64, &[u8]> = TableDefinition::new("performance_data");
const EVIDENCE: TableDefinition<u64, &[u8]> = TableDefinition::new("evidence_documents");
const ASSESSMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("assessments");
const CRITERIA: TableDefinition<u64, &[u8]> = TableDefinition::new("assessment_criteria");
const AUDIT: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_log");

/// `(instansi, code) -> indicator id`; one code per institution.
const IDX_INDICATOR_CODE: TableDefinition<(u64, &str), u64> =
    TableDefinition::new("idx_indicator_code");
/// `(indicator, year) -> target id`; one target per indicator and year.
const IDX_TARGET_YEAR: TableDefinition<(u64, i32), u64> = TableDefinition::new("idx_target_year");
/// `(indicator, instansi, period) -> data id`; one record per period.
const IDX_DATA_PERIOD: TableDefinition<(u64, u64, &str), u64> =
    TableDefinition::new("idx_data_period");
/// `data id -> assessment id`; one assessment per data record.
const IDX_ASSESSMENT_DATA: TableDefinition<u64, u64> =
    TableDefinition::new("idx_assessment_data");
/// `(indicator, year, quarter) -> encoded report`; one rollup per quarter.
const QUARTERLY: TableDefinition<(u64, i32, u8), &[u8]> =
    TableDefinition::new("quarterly_reports");

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WorkflowError> {
    Ok(postcard::to_allocvec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WorkflowError> {
    Ok(postcard::from_bytes(bytes)?)
}

// =============================================================================
// STORE
// =============================================================================

/// The persistent record store behind the workflow engine.
pub struct WorkflowStore {
    db: Database,
}

impl WorkflowStore {
    /// Open (or create) the store at `path`, creating all tables so later
    /// readers never race table creation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        {
            txn.open_table(SEQUENCES)?;
            txn.open_table(INSTANSI)?;
            txn.open_table(USERS)?;
            txn.open_table(INDICATORS)?;
            txn.open_table(TARGETS)?;
            txn.open_table(DATA)?;
            txn.open_table(EVIDENCE)?;
            txn.open_table(ASSESSMENTS)?;
            txn.open_table(CRITERIA)?;
            txn.open_table(AUDIT)?;
            txn.open_table(IDX_INDICATOR_CODE)?;
            txn.open_table(IDX_TARGET_YEAR)?;
            txn.open_table(IDX_DATA_PERIOD)?;
            txn.open_table(IDX_ASSESSMENT_DATA)?;
            txn.open_table(QUARTERLY)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    /// Next id from the named sequence, inside an existing transaction.
    fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64, WorkflowError> {
        let mut table = txn.open_table(SEQUENCES)?;
        let next = table.get(sequence)?.map_or(1, |v| v.value() + 1);
        table.insert(sequence, next)?;
        Ok(next)
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'static, u64, &'static [u8]>,
        kind: &'static str,
        id: u64,
    ) -> Result<T, WorkflowError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(table)?;
        let guard = table.get(id)?.ok_or(WorkflowError::NotFound {
            kind,
            id: id.to_string(),
        })?;
        decode(guard.value())
    }

    fn scan_records<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'static, u64, &'static [u8]>,
    ) -> Result<Vec<T>, WorkflowError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(table)?;
        let mut out = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    // =========================================================================
    // INSTITUTIONS AND USERS
    // =========================================================================

    pub fn create_instansi(&self, code: String, name: String) -> Result<Instansi, WorkflowError> {
        let txn = self.db.begin_write()?;
        let record = {
            let id = Self::next_id(&txn, "instansi")?;
            let record = Instansi {
                id: InstansiId(id),
                code,
                name,
                active: true,
            };
            let mut table = txn.open_table(INSTANSI)?;
            table.insert(id, encode(&record)?.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    pub fn get_instansi(&self, id: InstansiId) -> Result<Instansi, WorkflowError> {
        self.get_record(INSTANSI, "instansi", id.0)
    }

    /// Delete an institution. Restricted while any indicator still belongs
    /// to it; performance history may never be orphaned.
    pub fn delete_instansi(&self, id: InstansiId) -> Result<(), WorkflowError> {
        let indicators: Vec<PerformanceIndicator> = self.scan_records(INDICATORS)?;
        if indicators.iter().any(|i| i.instansi == id) {
            return Err(WorkflowError::DeletionRestricted {
                kind: "instansi",
                id: id.to_string(),
                reason: "indicators still reference it".into(),
            });
        }
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(INSTANSI)?;
            table.remove(id.0)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn put_user(&self, user: &UserRecord) -> Result<(), WorkflowError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(USERS)?;
            table.insert(user.id.0, encode(user)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn create_user(
        &self,
        name: String,
        instansi: Option<InstansiId>,
        permissions: impl IntoIterator<Item = String>,
        superuser: bool,
    ) -> Result<UserRecord, WorkflowError> {
        let txn = self.db.begin_write()?;
        let record = {
            let id = Self::next_id(&txn, "users")?;
            let record = UserRecord {
                id: UserId(id),
                name,
                instansi,
                permissions: permissions.into_iter().collect(),
                superuser,
                deleted: false,
            };
            let mut table = txn.open_table(USERS)?;
            table.insert(id, encode(&record)?.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    pub fn get_user(&self, id: UserId) -> Result<UserRecord, WorkflowError> {
        self.get_record(USERS, "user", id.0)
    }

    /// Soft-delete: the tombstoned account stays resolvable for audit
    /// history and authored records.
    pub fn soft_delete_user(&self, id: UserId) -> Result<UserRecord, WorkflowError> {
        let mut user = self.get_user(id)?;
        user.deleted = true;
        self.put_user(&user)?;
        Ok(user)
    }

    /// Hard delete. Restricted while the account authored any record;
    /// optional reviewer stamps elsewhere are set to null so reports
    /// survive the removal.
    pub fn force_delete_user(&self, id: UserId) -> Result<(), WorkflowError> {
        let restricted = |reason: &str| WorkflowError::DeletionRestricted {
            kind: "user",
            id: id.to_string(),
            reason: reason.into(),
        };

        let data: Vec<PerformanceData> = self.scan_records(DATA)?;
        if data.iter().any(|d| d.created_by == id) {
            return Err(restricted("performance data authored by this account"));
        }
        let targets: Vec<Target> = self.scan_records(TARGETS)?;
        if targets.iter().any(|t| t.created_by == id) {
            return Err(restricted("targets authored by this account"));
        }
        let evidence: Vec<EvidenceDocument> = self.scan_records(EVIDENCE)?;
        if evidence.iter().any(|e| e.uploaded_by == id) {
            return Err(restricted("evidence uploaded by this account"));
        }
        let assessments: Vec<Assessment> = self.scan_records(ASSESSMENTS)?;
        if assessments.iter().any(|a| a.assessed_by == id) {
            return Err(restricted("assessments owned by this account"));
        }

        let txn = self.db.begin_write()?;
        {
            // Null out reviewer stamps pointing at the removed account.
            let mut data_table = txn.open_table(DATA)?;
            for mut record in data {
                let mut touched = false;
                for slot in [
                    &mut record.submitted_by,
                    &mut record.validated_by,
                    &mut record.audited_by,
                ] {
                    if *slot == Some(id) {
                        *slot = None;
                        touched = true;
                    }
                }
                if touched {
                    data_table.insert(record.id.0, encode(&record)?.as_slice())?;
                }
            }
            let mut target_table = txn.open_table(TARGETS)?;
            for mut record in targets {
                let mut touched = false;
                for slot in [&mut record.submitted_by, &mut record.approved_by] {
                    if *slot == Some(id) {
                        *slot = None;
                        touched = true;
                    }
                }
                if touched {
                    target_table.insert(record.id.0, encode(&record)?.as_slice())?;
                }
            }
            let mut users = txn.open_table(USERS)?;
            users.remove(id.0)?;
        }
        txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // INDICATORS
    // =========================================================================

    pub fn create_indicator(
        &self,
        instansi: InstansiId,
        code: String,
        name: String,
        measurement_unit: String,
        weight: Decimal2,
        mandatory: bool,
    ) -> Result<PerformanceIndicator, WorkflowError> {
        let txn = self.db.begin_write()?;
        let record = {
            let mut index = txn.open_table(IDX_INDICATOR_CODE)?;
            if index.get((instansi.0, code.as_str()))?.is_some() {
                return Err(WorkflowError::duplicate(format!(
                    "indicator code `{code}` in instansi {instansi}"
                )));
            }
            let id = Self::next_id(&txn, "indicators")?;
            index.insert((instansi.0, code.as_str()), id)?;
            let record = PerformanceIndicator {
                id: IndicatorId(id),
                instansi,
                code,
                name,
                measurement_unit,
                weight,
                mandatory,
                deleted: false,
            };
            let mut table = txn.open_table(INDICATORS)?;
            table.insert(id, encode(&record)?.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    pub fn get_indicator(&self, id: IndicatorId) -> Result<PerformanceIndicator, WorkflowError> {
        self.get_record(INDICATORS, "indicator", id.0)
    }

    /// Delete an indicator: tombstoned while performance data references
    /// it, removed outright otherwise.
    pub fn delete_indicator(&self, id: IndicatorId) -> Result<(), WorkflowError> {
        let mut indicator = self.get_indicator(id)?;
        let data: Vec<PerformanceData> = self.scan_records(DATA)?;
        let referenced = data.iter().any(|d| d.indicator == id);

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(INDICATORS)?;
            if referenced {
                indicator.deleted = true;
                table.insert(id.0, encode(&indicator)?.as_slice())?;
            } else {
                table.remove(id.0)?;
                let mut index = txn.open_table(IDX_INDICATOR_CODE)?;
                index.remove((indicator.instansi.0, indicator.code.as_str()))?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // TARGETS
    // =========================================================================

    fn check_target_values(
        target_value: Decimal2,
        minimum_value: Option<Decimal2>,
    ) -> Result<(), WorkflowError> {
        if let Some(minimum) = minimum_value {
            if minimum > target_value {
                return Err(WorkflowError::invalid_field(
                    "minimum_value",
                    format!("minimum {minimum} exceeds target {target_value}"),
                ));
            }
        }
        Ok(())
    }

    pub fn create_target(
        &self,
        indicator: IndicatorId,
        instansi: InstansiId,
        year: i32,
        target_value: Decimal2,
        minimum_value: Option<Decimal2>,
        created_by: UserId,
    ) -> Result<Target, WorkflowError> {
        Self::check_target_values(target_value, minimum_value)?;
        let txn = self.db.begin_write()?;
        let record = {
            let mut index = txn.open_table(IDX_TARGET_YEAR)?;
            if index.get((indicator.0, year))?.is_some() {
                return Err(WorkflowError::duplicate(format!(
                    "target for indicator {indicator} in {year}"
                )));
            }
            let id = Self::next_id(&txn, "targets")?;
            index.insert((indicator.0, year), id)?;
            let record = Target {
                id: TargetId(id),
                indicator,
                instansi,
                year,
                target_value,
                minimum_value,
                justification: None,
                status: crate::model::TargetStatus::Draft,
                created_by,
                submitted_by: None,
                submitted_at: None,
                approved_by: None,
                approved_at: None,
            };
            let mut table = txn.open_table(TARGETS)?;
            table.insert(id, encode(&record)?.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    pub fn get_target(&self, id: TargetId) -> Result<Target, WorkflowError> {
        self.get_record(TARGETS, "target", id.0)
    }

    pub fn put_target(&self, target: &Target) -> Result<(), WorkflowError> {
        Self::check_target_values(target.target_value, target.minimum_value)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(TARGETS)?;
            table.insert(target.id.0, encode(target)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// The yearly target for an indicator, if one exists.
    pub fn target_for_year(
        &self,
        indicator: IndicatorId,
        year: i32,
    ) -> Result<Option<Target>, WorkflowError> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(IDX_TARGET_YEAR)?;
        let Some(id) = index.get((indicator.0, year))?.map(|v| v.value()) else {
            return Ok(None);
        };
        drop(index);
        let table = txn.open_table(TARGETS)?;
        let guard = table.get(id)?.ok_or(WorkflowError::NotFound {
            kind: "target",
            id: id.to_string(),
        })?;
        Ok(Some(decode(guard.value())?))
    }

    // =========================================================================
    // PERFORMANCE DATA AND EVIDENCE
    // =========================================================================

    pub fn create_data(&self, mut data: PerformanceData) -> Result<PerformanceData, WorkflowError> {
        let period_key = data.period.key();
        let txn = self.db.begin_write()?;
        let record = {
            let mut index = txn.open_table(IDX_DATA_PERIOD)?;
            if index
                .get((data.indicator.0, data.instansi.0, period_key.as_str()))?
                .is_some()
            {
                return Err(WorkflowError::duplicate(format!(
                    "performance data for indicator {} in {period_key}",
                    data.indicator
                )));
            }
            let id = Self::next_id(&txn, "performance_data")?;
            data.id = DataId(id);
            index.insert((data.indicator.0, data.instansi.0, period_key.as_str()), id)?;
            let mut table = txn.open_table(DATA)?;
            table.insert(id, encode(&data)?.as_slice())?;
            data
        };
        txn.commit()?;
        Ok(record)
    }

    pub fn get_data(&self, id: DataId) -> Result<PerformanceData, WorkflowError> {
        self.get_record(DATA, "performance_data", id.0)
    }

    pub fn put_data(&self, data: &PerformanceData) -> Result<(), WorkflowError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DATA)?;
            table.insert(data.id.0, encode(data)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// All monthly records for one indicator and institution in one year.
    pub fn data_for_year(
        &self,
        indicator: IndicatorId,
        instansi: InstansiId,
        year: i32,
    ) -> Result<Vec<PerformanceData>, WorkflowError> {
        let all: Vec<PerformanceData> = self.scan_records(DATA)?;
        Ok(all
            .into_iter()
            .filter(|d| {
                d.indicator == indicator && d.instansi == instansi && d.period.year == year
            })
            .collect())
    }

    pub fn create_evidence(
        &self,
        mut evidence: EvidenceDocument,
    ) -> Result<EvidenceDocument, WorkflowError> {
        let txn = self.db.begin_write()?;
        let record = {
            let id = Self::next_id(&txn, "evidence_documents")?;
            evidence.id = EvidenceId(id);
            let mut table = txn.open_table(EVIDENCE)?;
            table.insert(id, encode(&evidence)?.as_slice())?;
            evidence
        };
        txn.commit()?;
        Ok(record)
    }

    pub fn get_evidence(&self, id: EvidenceId) -> Result<EvidenceDocument, WorkflowError> {
        self.get_record(EVIDENCE, "evidence_document", id.0)
    }

    pub fn put_evidence(&self, evidence: &EvidenceDocument) -> Result<(), WorkflowError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(EVIDENCE)?;
            table.insert(evidence.id.0, encode(evidence)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // ASSESSMENTS AND CRITERIA
    // =========================================================================

    pub fn create_assessment(
        &self,
        data: DataId,
        instansi: InstansiId,
        assessed_by: UserId,
    ) -> Result<Assessment, WorkflowError> {
        let txn = self.db.begin_write()?;
        let record = {
            let mut index = txn.open_table(IDX_ASSESSMENT_DATA)?;
            if index.get(data.0)?.is_some() {
                return Err(WorkflowError::duplicate(format!(
                    "assessment for performance data {data}"
                )));
            }
            let id = Self::next_id(&txn, "assessments")?;
            index.insert(data.0, id)?;
            let record = Assessment {
                id: AssessmentId(id),
                data,
                instansi,
                assessed_by,
                overall_score: None,
                comments: None,
                status: crate::model::AssessmentStatus::Pending,
                assessed_at: None,
                approved_by: None,
                approved_at: None,
            };
            let mut table = txn.open_table(ASSESSMENTS)?;
            table.insert(id, encode(&record)?.as_slice())?;
            record
        };
        txn.commit()?;
        Ok(record)
    }

    pub fn get_assessment(&self, id: AssessmentId) -> Result<Assessment, WorkflowError> {
        self.get_record(ASSESSMENTS, "assessment", id.0)
    }

    pub fn put_assessment(&self, assessment: &Assessment) -> Result<(), WorkflowError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(ASSESSMENTS)?;
            table.insert(assessment.id.0, encode(assessment)?.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn criteria_for(
        &self,
        assessment: AssessmentId,
    ) -> Result<Vec<AssessmentCriterion>, WorkflowError> {
        let all: Vec<AssessmentCriterion> = self.scan_records(CRITERIA)?;
        Ok(all.into_iter().filter(|c| c.assessment == assessment).collect())
    }

    /// Insert or update a criterion and recompute the owning assessment's
    /// overall score in the same transaction, so no reader ever observes a
    /// stale score.
    pub fn upsert_criterion(
        &self,
        mut criterion: AssessmentCriterion,
    ) -> Result<(AssessmentCriterion, Option<Decimal2>), WorkflowError> {
        // Scores live on a 0-100 scale; weights must not be negative.
        if criterion.score < Decimal2::ZERO || criterion.score > Decimal2::ONE_HUNDRED {
            return Err(WorkflowError::invalid_field(
                "score",
                format!("{} is outside the 0-100 range", criterion.score),
            ));
        }
        if criterion.weight < Decimal2::ZERO {
            return Err(WorkflowError::invalid_field(
                "weight",
                format!("{} is negative", criterion.weight),
            ));
        }
        let assessment_id = criterion.assessment;
        let txn = self.db.begin_write()?;
        let (record, score) = {
            let mut table = txn.open_table(CRITERIA)?;
            if criterion.id.0 == 0 {
                criterion.id = CriterionId(Self::next_id(&txn, "assessment_criteria")?);
            }
            table.insert(criterion.id.0, encode(&criterion)?.as_slice())?;

            let mut criteria = Vec::new();
            for entry in table.iter()? {
                let (_, value) = entry?;
                let stored: AssessmentCriterion = decode(value.value())?;
                if stored.assessment == assessment_id {
                    criteria.push(stored);
                }
            }
            let score = compute_overall_score(&criteria);

            let mut assessments = txn.open_table(ASSESSMENTS)?;
            let mut assessment: Assessment = {
                let guard =
                    assessments
                        .get(assessment_id.0)?
                        .ok_or(WorkflowError::NotFound {
                            kind: "assessment",
                            id: assessment_id.to_string(),
                        })?;
                decode(guard.value())?
            };
            assessment.overall_score = score;
            assessments.insert(assessment_id.0, encode(&assessment)?.as_slice())?;
            (criterion, score)
        };
        txn.commit()?;
        Ok((record, score))
    }

    /// Recompute and persist an assessment's overall score from its stored
    /// criteria.
    pub fn recompute_assessment_score(
        &self,
        id: AssessmentId,
    ) -> Result<Option<Decimal2>, WorkflowError> {
        let txn = self.db.begin_write()?;
        let score = {
            let criteria_table = txn.open_table(CRITERIA)?;
            let mut criteria = Vec::new();
            for entry in criteria_table.iter()? {
                let (_, value) = entry?;
                let stored: AssessmentCriterion = decode(value.value())?;
                if stored.assessment == id {
                    criteria.push(stored);
                }
            }
            let score = compute_overall_score(&criteria);

            let mut assessments = txn.open_table(ASSESSMENTS)?;
            let mut assessment: Assessment = {
                let guard = assessments.get(id.0)?.ok_or(WorkflowError::NotFound {
                    kind: "assessment",
                    id: id.to_string(),
                })?;
                decode(guard.value())?
            };
            assessment.overall_score = score;
            assessments.insert(id.0, encode(&assessment)?.as_slice())?;
            score
        };
        txn.commit()?;
        Ok(score)
    }

    // =========================================================================
    // QUARTERLY REPORTS
    // =========================================================================

    /// Persist a quarterly rollup. Fails with `DuplicateRecord` when the
    /// (indicator, year, quarter) slot is already occupied.
    pub fn create_quarterly(&self, report: &QuarterlyReport) -> Result<(), WorkflowError> {
        self.create_quarterly_inner(report, None)
    }

    /// Persist a quarterly rollup and its audit entry in one transaction.
    pub fn create_quarterly_with_audit(
        &self,
        report: &QuarterlyReport,
        entry: &AuditEntry,
    ) -> Result<(), WorkflowError> {
        self.create_quarterly_inner(report, Some(entry))
    }

    fn create_quarterly_inner(
        &self,
        report: &QuarterlyReport,
        entry: Option<&AuditEntry>,
    ) -> Result<(), WorkflowError> {
        let key = (
            report.indicator.0,
            report.year,
            report.quarter.number() as u8,
        );
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(QUARTERLY)?;
            if table.get(key)?.is_some() {
                return Err(WorkflowError::duplicate(format!(
                    "quarterly report for indicator {} {} {}",
                    report.indicator, report.year, report.quarter
                )));
            }
            table.insert(key, encode(report)?.as_slice())?;
            if let Some(entry) = entry {
                Self::append_audit_in(&txn, entry)?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_quarterly(
        &self,
        indicator: IndicatorId,
        year: i32,
        quarter: Quarter,
    ) -> Result<Option<QuarterlyReport>, WorkflowError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(QUARTERLY)?;
        match table.get((indicator.0, year, quarter.number() as u8))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // AUDITED RECORD UPDATES
    // =========================================================================

    fn append_audit_in(txn: &WriteTransaction, entry: &AuditEntry) -> Result<(), WorkflowError> {
        let id = Self::next_id(txn, "audit_log")?;
        let mut table = txn.open_table(AUDIT)?;
        table.insert(id, encode(entry)?.as_slice())?;
        Ok(())
    }

    fn put_with_audit(
        &self,
        table: TableDefinition<'static, u64, &'static [u8]>,
        id: u64,
        bytes: &[u8],
        entry: &AuditEntry,
    ) -> Result<(), WorkflowError> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(table)?;
            table.insert(id, bytes)?;
            Self::append_audit_in(&txn, entry)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Persist an updated record together with its audit entry; either
    /// both land or neither does.
    pub fn put_data_with_audit(
        &self,
        data: &PerformanceData,
        entry: &AuditEntry,
    ) -> Result<(), WorkflowError> {
        self.put_with_audit(DATA, data.id.0, &encode(data)?, entry)
    }

    pub fn put_target_with_audit(
        &self,
        target: &Target,
        entry: &AuditEntry,
    ) -> Result<(), WorkflowError> {
        Self::check_target_values(target.target_value, target.minimum_value)?;
        self.put_with_audit(TARGETS, target.id.0, &encode(target)?, entry)
    }

    pub fn put_evidence_with_audit(
        &self,
        evidence: &EvidenceDocument,
        entry: &AuditEntry,
    ) -> Result<(), WorkflowError> {
        self.put_with_audit(EVIDENCE, evidence.id.0, &encode(evidence)?, entry)
    }

    pub fn put_assessment_with_audit(
        &self,
        assessment: &Assessment,
        entry: &AuditEntry,
    ) -> Result<(), WorkflowError> {
        self.put_with_audit(ASSESSMENTS, assessment.id.0, &encode(assessment)?, entry)
    }

    // =========================================================================
    // AUDIT LOG
    // =========================================================================

    /// Everything recorded so far, oldest first.
    pub fn audit_entries(&self) -> Result<Vec<AuditEntry>, WorkflowError> {
        self.scan_records(AUDIT)
    }
}

impl AuditSink for WorkflowStore {
    fn append(&self, entry: AuditEntry) -> Result<(), WorkflowError> {
        let txn = self.db.begin_write()?;
        Self::append_audit_in(&txn, &entry)?;
        txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Audit Trail
//!
//! Every state-changing operation emits one audit entry: who did what to
//! which record, the status before and after, and when. The sink is a
//! trait so the engine can write to its database table in production and
//! to memory under test.

use crate::error::WorkflowError;
use crate::ids::UserId;
use crate::model::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: UserId,
    /// Dotted action name, e.g. `performance_data.validate`.
    pub action: String,
    pub entity_kind: EntityKind,
    pub entity_id: u64,
    /// Status before the change; `None` for creations.
    pub before: Option<String>,
    /// Status after the change; `None` for deletions.
    pub after: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    #[must_use]
    pub fn new(
        actor: UserId,
        action: impl Into<String>,
        entity_kind: EntityKind,
        entity_id: u64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor,
            action: action.into(),
            entity_kind,
            entity_id,
            before: None,
            after: None,
            at,
        }
    }

    #[must_use]
    pub fn with_states(
        mut self,
        before: Option<impl Into<String>>,
        after: Option<impl Into<String>>,
    ) -> Self {
        self.before = before.map(Into::into);
        self.after = after.map(Into::into);
        self
    }
}

/// Destination for audit entries.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: AuditEntry) -> Result<(), WorkflowError>;
}

/// In-memory sink for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, entry: AuditEntry) -> Result<(), WorkflowError> {
        match self.entries.lock() {
            Ok(mut guard) => {
                guard.push(entry);
                Ok(())
            }
            Err(poisoned) => {
                poisoned.into_inner().push(entry);
                Ok(())
            }
        }
    }
}

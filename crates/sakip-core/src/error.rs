//! # Error Types
//!
//! One closed error enum for the whole engine. Every variant is a business
//! outcome reported to the caller; none are retried automatically, since
//! they are driven by record state rather than transient faults.

use thiserror::Error;

/// Errors produced by the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The actor is not authorized for the requested action.
    #[error("not allowed to perform `{action}`")]
    Forbidden {
        /// The action that was denied.
        action: String,
    },

    /// The transition graph has no edge for the current status and action.
    #[error("no `{action}` transition from status `{from}`")]
    IllegalTransition {
        /// The entity's current status.
        from: String,
        /// The requested action.
        action: String,
    },

    /// The submission window for the record's period has closed.
    #[error("submission window closed on {deadline}")]
    DeadlineExceeded {
        /// Last calendar day on which the action was permitted.
        deadline: chrono::NaiveDate,
    },

    /// A uniqueness invariant would be violated (duplicate period,
    /// duplicate quarter, duplicate per-year target, second assessment).
    #[error("record already exists for {key}")]
    DuplicateRecord {
        /// Human-readable description of the occupied key.
        key: String,
    },

    /// Aggregation was asked to roll up a quarter with no monthly records.
    #[error("no monthly data for the requested quarter")]
    NoData,

    /// The entity sits in a terminal-locked status; only the privileged
    /// revise action may reopen it.
    #[error("entity is locked in status `{status}`")]
    LockedEntity {
        /// The locked status.
        status: String,
    },

    /// A referenced record does not exist.
    #[error("{kind} `{id}` not found")]
    NotFound {
        /// Entity kind label.
        kind: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// A field constraint was violated on write (value ranges, ordering
    /// between fields).
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// What the constraint requires.
        reason: String,
    },

    /// A relation's deletion policy forbids the requested removal.
    #[error("cannot delete {kind} `{id}`: {reason}")]
    DeletionRestricted {
        /// Entity kind label.
        kind: &'static str,
        /// Identifier of the protected record.
        id: String,
        /// Which references protect it.
        reason: String,
    },

    /// The storage collaborator failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    /// Build a `Forbidden` error for a named action.
    #[must_use]
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    /// Build a `DuplicateRecord` error for a described key.
    #[must_use]
    pub fn duplicate(key: impl Into<String>) -> Self {
        Self::DuplicateRecord { key: key.into() }
    }

    /// Build an `InvalidField` error for a named field.
    #[must_use]
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for WorkflowError {
                fn from(err: $ty) -> Self {
                    Self::Storage(err.to_string())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    postcard::Error,
);

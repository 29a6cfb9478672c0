//! # Storage Module
//!
//! Disk-backed record store using redb.
//!
//! Uses redb embedded database for:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Uniqueness invariants (one data record per indicator/institution/period,
//! one target per indicator/year, one assessment per data record, one
//! quarterly report per indicator/year/quarter) live in index tables checked
//! inside the same write transaction as the insert, so two racing writers
//! cannot both pass the check.

mod store;

pub use store::WorkflowStore;

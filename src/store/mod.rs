//! Table storage behind the ledger.
//!
//! The backing store only offers whole-table reads and whole-table
//! replacement, with no locking and no uniqueness constraints. Everything
//! above this module must assume another writer can interleave between a
//! read and the following replace.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::model::attendance::AttendanceRecord;

pub mod cached;
pub mod memory;
pub mod mysql;
pub mod table;

/// One flat row, keyed by column name.
pub type Row = BTreeMap<String, String>;

/// Raw tabular backend: named sheets of string cells.
#[async_trait]
pub trait TableBackend: Send + Sync {
    async fn read_table(&self, table: &str) -> Result<Vec<Row>, LedgerError>;

    async fn replace_table(&self, table: &str, rows: Vec<Row>) -> Result<(), LedgerError>;
}

/// Typed view of the attendance table the engine works against.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Snapshot of the whole table. No ordering guarantee; may be stale.
    async fn read_all(&self) -> Result<Vec<AttendanceRecord>, LedgerError>;

    /// Overwrites the whole table. Not atomic with respect to `read_all`.
    async fn replace_all(&self, records: Vec<AttendanceRecord>) -> Result<(), LedgerError>;
}

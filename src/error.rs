//! Typed failures raised by the merge core.
//!
//! Every variant is scoped to a single file: the batch driver in
//! [`crate::evolve`] logs it and moves on to the next file.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvolveError {
    /// A row's field count differs from the header's.
    #[error("Malformed table: row {row} has {found} field(s), expected {expected}")]
    MalformedTable {
        /// 1-based position of the offending row; 0 when the table has no header at all.
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The new table has fewer rows than the old one, or either side is empty.
    #[error("Row count mismatch: new table has {new} row(s), old table has {old}")]
    RowCount { new: usize, old: usize },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

pub type Result<T> = std::result::Result<T, EvolveError>;

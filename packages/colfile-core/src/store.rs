//! Storage-handle contract shared by all file backends.

use colfile_types::{RecordBatch, Value};

use crate::error::StoreError;

/// One fully materialized column returned by a scan.
///
/// Carries its name so partial results can be merged by name regardless of
/// the order partitions arrive in.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    /// Column name
    pub name: String,
    /// Decoded values in original row order
    pub values: Vec<Value>,
}

/// Contract every file backend exposes.
pub trait ColumnarStore {
    /// Reads the requested columns, fully materialized, in requested order.
    ///
    /// Unknown column names are silently skipped, so the result may contain
    /// fewer columns than were requested.
    fn scan(&mut self, columns: &[String]) -> Result<Vec<ColumnData>, StoreError>;

    /// Replaces the entire file contents with the given batch.
    fn write(&mut self, batch: &RecordBatch) -> Result<(), StoreError>;

    /// Releases the underlying descriptor. No implicit flush beyond what
    /// `write` already performed.
    fn close(&mut self) -> Result<(), StoreError>;
}

//! Row-major records and write batches.

use thiserror::Error;

use crate::column::Schema;
use crate::value::Value;

/// Error type for record batch construction.
#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    /// A row's value count does not match the schema.
    #[error("row {row} has {got} values, schema has {expected} columns")]
    ArityMismatch {
        /// Row index within the batch.
        row: usize,
        /// Column count declared by the schema.
        expected: usize,
        /// Value count found in the row.
        got: usize,
    },
}

/// One row of values, ordered per the requesting scan's column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    /// Creates a record from an ordered value list.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at the given column position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of values in this record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the record, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Record::new(values)
    }
}

/// A uniform batch of rows plus the schema describing them.
///
/// The schema is explicit: the writer never infers column layout from row
/// contents. Construction validates row arity; value types are checked by
/// the codec at encode time so a mismatch surfaces as a recoverable error.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    schema: Schema,
    rows: Vec<Record>,
}

impl RecordBatch {
    /// Creates a batch, validating that every row matches the schema's arity.
    pub fn new(schema: Schema, rows: Vec<Record>) -> Result<Self, BatchError> {
        let expected = schema.len();
        for (row, record) in rows.iter().enumerate() {
            if record.len() != expected {
                return Err(BatchError::ArityMismatch {
                    row,
                    expected,
                    got: record.len(),
                });
            }
        }
        Ok(Self { schema, rows })
    }

    /// Returns the batch schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

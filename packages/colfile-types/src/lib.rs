//! Shared data model for columnar file backends.
//!
//! This crate defines column types, the value union, schemas, and the
//! record/batch model shared by the storage backends and the scan engine.

pub mod column;
pub mod record;
pub mod value;

pub use column::{ColumnSpec, ColumnType, Schema};
pub use record::{BatchError, Record, RecordBatch};
pub use value::Value;

//! Storage and scan error types.

use colfile_types::ColumnType;
use thiserror::Error;

/// Errors from file backends and the parallel scanner.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// I/O error during open/read/write
    #[error("I/O error: {0}")]
    Io(String),

    /// Malformed or truncated on-disk data; offsets are trusted, so a short
    /// span means the file or its offset table is damaged
    #[error("Data corruption detected: {0}")]
    Corruption(String),

    /// Value variant does not match the target column type on encode
    #[error("Type mismatch: expected {expected:?}, got {got:?}")]
    TypeMismatch {
        expected: ColumnType,
        got: ColumnType,
    },

    /// Reserved column type with no codec
    #[error("Column type {0:?} is not supported")]
    UnsupportedType(ColumnType),

    /// Write called with no rows
    #[error("Cannot write an empty batch")]
    EmptyBatch,

    /// Batch rows disagree with the declared schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// File extension maps to no known backend
    #[error("Unknown file type: '{0}'")]
    UnknownFileType(String),

    /// A scan partition worker failed; the whole scan fails with it
    #[error("Scan worker failed: {0}")]
    WorkerFailed(String),

    /// The coordinator's bounded wait for partition results expired
    #[error("Scan timed out after {0} ms")]
    ScanTimeout(u64),

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Wraps an I/O error with an operation context string.
pub(crate) fn io_err(context: &str, error: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {}", context, error))
}

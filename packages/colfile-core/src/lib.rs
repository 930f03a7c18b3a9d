//! Naive columnar file format and column-partitioned parallel scan engine.
//!
//! Provides the per-type codec, the metadata trailer, the columnar and
//! jsonl file backends, and the parallel scan coordinator.

pub mod codec;
pub mod config;
pub mod error;
pub mod file;
pub mod jsonl;
mod lock;
pub mod metadata;
pub mod scanner;
pub mod store;

pub use config::ScanConfig;
pub use error::StoreError;
pub use file::ColumnFile;
pub use jsonl::JsonlFile;
pub use metadata::{ColumnDefinition, Metadata};
pub use scanner::{FileType, ParallelScanner};
pub use store::{ColumnData, ColumnarStore};

//! Column-partitioned parallel scan coordinator.
//!
//! Fans a requested column set out across worker threads, each of which
//! opens its own file handle and scans only its partition, then fans the
//! partial column vectors back in over a channel and reassembles row-major
//! records. Only the columnar backend splits; the jsonl backend always runs
//! a single sequential pass.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use colfile_types::{Record, Schema, Value};

use crate::config::ScanConfig;
use crate::error::StoreError;
use crate::file::ColumnFile;
use crate::jsonl::JsonlFile;
use crate::metadata::Metadata;
use crate::store::{ColumnData, ColumnarStore};

/// Backend selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// `.naive` columnar file, supports column-partitioned parallel scans
    Columnar,
    /// `.jsonl` line-delimited text file, always scanned sequentially
    JsonLines,
}

impl FileType {
    /// Maps a path's extension to a backend.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("naive") => Ok(FileType::Columnar),
            Some("jsonl") => Ok(FileType::JsonLines),
            Some(other) => Err(StoreError::UnknownFileType(other.to_string())),
            None => Err(StoreError::UnknownFileType(String::new())),
        }
    }
}

/// Parallel scan coordinator over one file.
#[derive(Debug, Clone)]
pub struct ParallelScanner {
    path: PathBuf,
    config: ScanConfig,
    text_schema: Option<Schema>,
}

impl ParallelScanner {
    /// Creates a scanner for the given file.
    pub fn new(path: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            path: path.into(),
            config,
            text_schema: None,
        }
    }

    /// Declares the schema used for jsonl files, which are not
    /// self-describing.
    pub fn with_text_schema(mut self, schema: Schema) -> Self {
        self.text_schema = Some(schema);
        self
    }

    /// Scans the requested columns and returns row-major records.
    ///
    /// Output column order follows the request (unknown names skipped) and
    /// row order is the original write order, independent of the split
    /// factor and of worker completion order.
    pub fn scan(&self, columns: &[String]) -> Result<Vec<Record>, StoreError> {
        match FileType::from_path(&self.path)? {
            FileType::Columnar => self.scan_columnar(columns),
            FileType::JsonLines => self.scan_jsonl(columns),
        }
    }

    fn scan_columnar(&self, columns: &[String]) -> Result<Vec<Record>, StoreError> {
        // One metadata read up front; workers re-open the file themselves.
        let mut probe = ColumnFile::open(&self.path)?;
        let Some(metadata) = probe.metadata().cloned() else {
            return Ok(Vec::new());
        };
        probe.close()?;

        let parallel_reads = self.config.parallel_reads.max(1);
        let partitions = partition_columns(&metadata, columns, parallel_reads);

        tracing::debug!(
            path = %self.path.display(),
            parallel_reads,
            requested = columns.len(),
            "starting parallel columnar scan"
        );

        // Fan out: one short-lived worker per partition, even empty ones.
        let (sender, receiver) = mpsc::channel();
        for partition in partitions {
            let sender = sender.clone();
            let path = self.path.clone();
            thread::spawn(move || {
                let result = scan_partition(&path, &partition);
                // Receiver may already have given up on a timeout.
                let _ = sender.send(result);
            });
        }
        drop(sender);

        // Fan in: exactly one receive per partition, bounded wait, arrival
        // order ignored. Any worker failure fails the whole scan.
        let timeout = Duration::from_millis(self.config.scan_timeout_ms);
        let mut scanned: Vec<ColumnData> = Vec::new();
        for _ in 0..parallel_reads {
            match receiver.recv_timeout(timeout) {
                Ok(Ok(partial)) => scanned.extend(partial),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "scan partition failed");
                    return Err(StoreError::WorkerFailed(e.to_string()));
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(StoreError::ScanTimeout(self.config.scan_timeout_ms));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(StoreError::WorkerFailed(
                        "partition worker dropped its result channel".to_string(),
                    ));
                }
            }
        }

        assemble_records(&metadata, columns, scanned)
    }

    fn scan_jsonl(&self, columns: &[String]) -> Result<Vec<Record>, StoreError> {
        let schema = self.text_schema.clone().ok_or_else(|| {
            StoreError::SchemaMismatch(
                "jsonl files are not self-describing; declare a schema with with_text_schema"
                    .to_string(),
            )
        })?;
        let mut file = JsonlFile::open(&self.path, schema)?;
        let scanned = file.scan(columns)?;
        file.close()?;

        let row_count = scanned.first().map_or(0, |c| c.values.len());
        let mut iters: Vec<_> = scanned.into_iter().map(|c| c.values.into_iter()).collect();
        let mut records = Vec::with_capacity(row_count);
        for _ in 0..row_count {
            let values = iters
                .iter_mut()
                .map(|it| {
                    it.next().ok_or_else(|| {
                        StoreError::Corruption("jsonl columns have unequal row counts".to_string())
                    })
                })
                .collect::<Result<Vec<Value>, _>>()?;
            records.push(Record::new(values));
        }
        Ok(records)
    }
}

/// Deterministic round-robin assignment over the requested columns in
/// file-schema order (not requested order).
fn partition_columns(
    metadata: &Metadata,
    columns: &[String],
    parallel_reads: usize,
) -> Vec<Vec<String>> {
    let mut partitions = vec![Vec::new(); parallel_reads];
    let mut assigned = 0usize;
    for col in &metadata.columns {
        if columns.iter().any(|c| *c == col.name) {
            partitions[assigned % parallel_reads].push(col.name.clone());
            assigned += 1;
        }
    }
    partitions
}

fn scan_partition(path: &Path, columns: &[String]) -> Result<Vec<ColumnData>, StoreError> {
    let mut file = ColumnFile::open(path)?;
    let result = file.scan(columns);
    file.close()?;
    result
}

/// Merges partition results into row-major records, keyed by column name so
/// arrival order is irrelevant.
fn assemble_records(
    metadata: &Metadata,
    columns: &[String],
    scanned: Vec<ColumnData>,
) -> Result<Vec<Record>, StoreError> {
    let row_count = metadata.row_count as usize;

    // Requested columns present in the file schema, in requested order.
    let projected: Vec<&String> = columns
        .iter()
        .filter(|name| metadata.index_of(name).is_some())
        .collect();

    // A name requested more than once is partitioned (and scanned) once,
    // so one returned column may have to fill several slots.
    let mut slots: Vec<Option<Vec<Value>>> = vec![None; projected.len()];
    for column in scanned {
        let matching: Vec<usize> = projected
            .iter()
            .enumerate()
            .filter(|(_, name)| ***name == column.name)
            .map(|(index, _)| index)
            .collect();
        if let Some((&last, rest)) = matching.split_last() {
            for &index in rest {
                slots[index] = Some(column.values.clone());
            }
            slots[last] = Some(column.values);
        }
    }

    let mut iters = Vec::with_capacity(slots.len());
    for (slot, name) in slots.into_iter().zip(&projected) {
        let values = slot.ok_or_else(|| {
            StoreError::WorkerFailed(format!("no partition returned column '{}'", name))
        })?;
        if values.len() != row_count {
            return Err(StoreError::Corruption(format!(
                "column '{}' returned {} values for {} rows",
                name,
                values.len(),
                row_count
            )));
        }
        iters.push(values.into_iter());
    }

    let mut records = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let values = iters
            .iter_mut()
            .map(|it| {
                it.next().ok_or_else(|| {
                    StoreError::Corruption("column stream ended before row count".to_string())
                })
            })
            .collect::<Result<Vec<Value>, _>>()?;
        records.push(Record::new(values));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colfile_types::ColumnType;

    fn metadata_with(names: &[&str]) -> Metadata {
        Metadata {
            row_count: 0,
            column_count: names.len() as u64,
            columns: names
                .iter()
                .map(|n| crate::metadata::ColumnDefinition {
                    name: n.to_string(),
                    ty: ColumnType::Int32,
                    offset: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn file_type_from_extension() {
        assert_eq!(
            FileType::from_path(Path::new("a/b.naive")).unwrap(),
            FileType::Columnar
        );
        assert_eq!(
            FileType::from_path(Path::new("a/b.jsonl")).unwrap(),
            FileType::JsonLines
        );
        assert!(matches!(
            FileType::from_path(Path::new("a/b.csv")),
            Err(StoreError::UnknownFileType(_))
        ));
    }

    #[test]
    fn round_robin_follows_schema_order() {
        let metadata = metadata_with(&["a", "b", "c", "d", "e"]);
        // Request out of schema order; assignment still walks a..e.
        let request: Vec<String> = ["e", "a", "c", "b"].iter().map(|s| s.to_string()).collect();
        let partitions = partition_columns(&metadata, &request, 2);
        assert_eq!(partitions[0], vec!["a", "c"]);
        assert_eq!(partitions[1], vec!["b", "e"]);
    }

    #[test]
    fn empty_partitions_are_kept() {
        let metadata = metadata_with(&["a"]);
        let request = vec!["a".to_string()];
        let partitions = partition_columns(&metadata, &request, 4);
        assert_eq!(partitions.len(), 4);
        assert_eq!(partitions[0], vec!["a"]);
        assert!(partitions[1].is_empty());
    }

    #[test]
    fn jsonl_scan_requires_schema() {
        let scanner = ParallelScanner::new("missing.jsonl", ScanConfig::default());
        let err = scanner.scan(&["a".to_string()]).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch(_)));
    }

    #[test]
    fn assemble_duplicated_request_fills_every_slot() {
        let mut metadata = metadata_with(&["a", "b"]);
        metadata.row_count = 2;
        let request: Vec<String> = vec!["a".to_string(), "a".to_string()];
        // The duplicated name is scanned once and must land in both slots.
        let scanned = vec![ColumnData {
            name: "a".to_string(),
            values: vec![Value::Int32(1), Value::Int32(2)],
        }];
        let records = assemble_records(&metadata, &request, scanned).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].values().to_vec(),
            vec![Value::Int32(1), Value::Int32(1)]
        );
        assert_eq!(
            records[1].values().to_vec(),
            vec![Value::Int32(2), Value::Int32(2)]
        );
    }

    #[test]
    fn assemble_fails_on_missing_column() {
        let metadata = metadata_with(&["a", "b"]);
        let request: Vec<String> = vec!["a".to_string(), "b".to_string()];
        // Partition results only cover "a".
        let scanned = vec![ColumnData {
            name: "a".to_string(),
            values: Vec::new(),
        }];
        let err = assemble_records(&metadata, &request, scanned).unwrap_err();
        assert!(matches!(err, StoreError::WorkerFailed(_)));
    }
}

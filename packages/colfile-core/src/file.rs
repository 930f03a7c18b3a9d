//! Naive columnar file handle: whole-file overwrite and column-pruned scans.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use colfile_types::{ColumnType, RecordBatch, Value};

use crate::codec::{decode_value, encode_value};
use crate::error::{io_err, StoreError};
use crate::lock;
use crate::metadata::{ColumnDefinition, Metadata};
use crate::store::{ColumnData, ColumnarStore};

/// Handle to one naive columnar file.
///
/// Owns the descriptor and, once the file has content, its [`Metadata`].
/// A freshly created empty file has no metadata; the first `write` installs
/// it. The format supports full-file overwrite only, no append.
#[derive(Debug)]
pub struct ColumnFile {
    path: PathBuf,
    file: Option<File>,
    metadata: Option<Metadata>,
    lock: Arc<RwLock<()>>,
}

impl ColumnFile {
    /// Opens a columnar file, creating it if missing.
    ///
    /// A zero-byte file is a valid schema-less state and yields a handle
    /// with no metadata. Any other trailer parse failure propagates.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| io_err("failed to open columnar file", e))?;

        let lock = lock::file_lock(&path);
        let metadata = {
            let _guard = lock.read().map_err(|_| StoreError::LockPoisoned)?;
            Metadata::read_trailer(&mut file)?
        };

        Ok(Self {
            path,
            file: Some(file),
            metadata,
            lock,
        })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the loaded metadata, if the file has any.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    fn file_mut(&mut self) -> Result<&mut File, StoreError> {
        self.file
            .as_mut()
            .ok_or_else(|| StoreError::Io("file handle is closed".to_string()))
    }

    fn read_column(
        file: &mut File,
        def: &ColumnDefinition,
        row_count: u64,
    ) -> Result<Vec<Value>, StoreError> {
        file.seek(SeekFrom::Start(def.offset))
            .map_err(|e| io_err("failed to seek to column offset", e))?;

        let mut values = Vec::with_capacity(row_count as usize);
        match def.ty.fixed_width() {
            Some(width) => {
                let mut stream = vec![0u8; width * row_count as usize];
                read_stream(file, &mut stream, &def.name)?;
                for chunk in stream.chunks_exact(width) {
                    values.push(decode_value(chunk, def.ty)?.0);
                }
            }
            None if def.ty == ColumnType::String => {
                let mut reader = BufReader::new(file);
                let mut len_buf = [0u8; 2];
                for _ in 0..row_count {
                    read_stream(&mut reader, &mut len_buf, &def.name)?;
                    let len = u16::from_le_bytes(len_buf) as usize;
                    let mut cell = vec![0u8; 2 + len];
                    cell[..2].copy_from_slice(&len_buf);
                    read_stream(&mut reader, &mut cell[2..], &def.name)?;
                    values.push(decode_value(&cell, def.ty)?.0);
                }
            }
            None => return Err(StoreError::UnsupportedType(def.ty)),
        }
        Ok(values)
    }
}

fn read_stream(reader: &mut impl Read, buf: &mut [u8], column: &str) -> Result<(), StoreError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            StoreError::Corruption(format!("column '{}' stream is truncated", column))
        } else {
            io_err("failed to read column stream", e)
        }
    })
}

impl ColumnarStore for ColumnFile {
    fn scan(&mut self, columns: &[String]) -> Result<Vec<ColumnData>, StoreError> {
        let lock = Arc::clone(&self.lock);
        let _guard = lock.read().map_err(|_| StoreError::LockPoisoned)?;

        let Some(metadata) = self.metadata.clone() else {
            // Schema-less file: every requested name is unknown.
            return Ok(Vec::new());
        };
        let file = self.file_mut()?;

        let mut results = Vec::with_capacity(columns.len());
        for name in columns {
            let Some(def) = metadata.column(name) else {
                tracing::debug!(column = %name, "requested column not in schema, skipping");
                continue;
            };
            let values = Self::read_column(file, def, metadata.row_count)?;
            results.push(ColumnData {
                name: name.clone(),
                values,
            });
        }
        Ok(results)
    }

    fn write(&mut self, batch: &RecordBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let schema = batch.schema();
        let row_count = batch.row_count() as u64;

        // Encode every column stream before touching the file, so an encode
        // error leaves the previous contents intact.
        let mut streams: Vec<Vec<u8>> = Vec::with_capacity(schema.len());
        let mut definitions: Vec<ColumnDefinition> = Vec::with_capacity(schema.len());
        let mut byte_offset = 0u64;
        for (index, spec) in schema.columns().iter().enumerate() {
            let mut stream = Vec::new();
            for row in batch.rows() {
                let value = row.get(index).ok_or_else(|| {
                    StoreError::SchemaMismatch(format!(
                        "row is missing a value for column '{}'",
                        spec.name
                    ))
                })?;
                encode_value(value, spec.ty, &mut stream)?;
            }
            definitions.push(ColumnDefinition {
                name: spec.name.clone(),
                ty: spec.ty,
                offset: byte_offset,
            });
            byte_offset += stream.len() as u64;
            streams.push(stream);
        }

        let metadata = Metadata {
            row_count,
            column_count: schema.len() as u64,
            columns: definitions,
        };
        let trailer = metadata.serialize();

        let lock = Arc::clone(&self.lock);
        let _guard = lock.write().map_err(|_| StoreError::LockPoisoned)?;
        let file = self.file_mut()?;

        // Full overwrite: discard prior contents before laying out streams.
        file.set_len(0)
            .map_err(|e| io_err("failed to truncate file", e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| io_err("failed to rewind file", e))?;
        for stream in &streams {
            file.write_all(stream)
                .map_err(|e| io_err("failed to write column stream", e))?;
        }
        file.write_all(&trailer)
            .map_err(|e| io_err("failed to write metadata trailer", e))?;
        file.sync_all()
            .map_err(|e| io_err("failed to sync file", e))?;

        tracing::debug!(
            path = %self.path.display(),
            rows = row_count,
            columns = schema.len(),
            bytes = byte_offset + trailer.len() as u64,
            "columnar file written"
        );
        self.metadata = Some(metadata);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.file = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colfile_types::{ColumnSpec, ColumnType, Record, Schema, Value};

    fn demo_batch() -> RecordBatch {
        let schema = Schema::new(vec![
            ColumnSpec::new("col_int", ColumnType::Int64),
            ColumnSpec::new("col_str", ColumnType::String),
        ]);
        let rows = vec![
            Record::new(vec![Value::Int64(1), Value::from("a")]),
            Record::new(vec![Value::Int64(2), Value::from("bb")]),
            Record::new(vec![Value::Int64(3), Value::from("ccc")]),
        ];
        RecordBatch::new(schema, rows).unwrap()
    }

    #[test]
    fn open_empty_file_has_no_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let file = ColumnFile::open(dir.path().join("empty.naive")).unwrap();
        assert!(file.metadata().is_none());
    }

    #[test]
    fn write_then_scan_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.naive");
        let mut file = ColumnFile::open(&path).unwrap();
        file.write(&demo_batch()).unwrap();

        let result = file
            .scan(&["col_str".to_string(), "col_int".to_string()])
            .unwrap();
        // Requested order, not schema order.
        assert_eq!(result[0].name, "col_str");
        assert_eq!(
            result[0].values,
            vec![Value::from("a"), Value::from("bb"), Value::from("ccc")]
        );
        assert_eq!(
            result[1].values,
            vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]
        );
    }

    #[test]
    fn reopen_reads_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.naive");
        ColumnFile::open(&path).unwrap().write(&demo_batch()).unwrap();

        let reopened = ColumnFile::open(&path).unwrap();
        let metadata = reopened.metadata().unwrap();
        assert_eq!(metadata.row_count, 3);
        assert_eq!(metadata.column_count, 2);
        assert_eq!(metadata.columns[0].name, "col_int");
    }

    #[test]
    fn offsets_are_contiguous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.naive");
        let mut file = ColumnFile::open(&path).unwrap();
        file.write(&demo_batch()).unwrap();

        let metadata = file.metadata().unwrap();
        // col_int: 3 rows x 8 bytes.
        assert_eq!(metadata.columns[0].offset, 0);
        assert_eq!(metadata.columns[1].offset, 24);
        // col_str streams: (2 + 1) + (2 + 2) + (2 + 3) bytes, then trailer.
        let file_len = std::fs::metadata(&path).unwrap().len();
        let trailer_len = metadata.serialize().len() as u64;
        assert_eq!(file_len, 24 + 12 + trailer_len);
    }

    #[test]
    fn write_replaces_prior_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.naive");
        let mut file = ColumnFile::open(&path).unwrap();
        file.write(&demo_batch()).unwrap();

        let schema = Schema::new(vec![ColumnSpec::new("only", ColumnType::Bool)]);
        let batch =
            RecordBatch::new(schema, vec![Record::new(vec![Value::Bool(true)])]).unwrap();
        file.write(&batch).unwrap();

        let reopened = ColumnFile::open(&path).unwrap();
        let metadata = reopened.metadata().unwrap();
        assert_eq!(metadata.row_count, 1);
        assert_eq!(metadata.column_count, 1);
        let file_len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(file_len, 1 + metadata.serialize().len() as u64);
    }

    #[test]
    fn unknown_column_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = ColumnFile::open(dir.path().join("demo.naive")).unwrap();
        file.write(&demo_batch()).unwrap();

        let result = file
            .scan(&["nope".to_string(), "col_int".to_string()])
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "col_int");
    }

    #[test]
    fn empty_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = ColumnFile::open(dir.path().join("demo.naive")).unwrap();
        let schema = Schema::new(vec![ColumnSpec::new("a", ColumnType::Int32)]);
        let batch = RecordBatch::new(schema, Vec::new()).unwrap();
        assert!(matches!(
            file.write(&batch).unwrap_err(),
            StoreError::EmptyBatch
        ));
    }

    #[test]
    fn type_mismatch_leaves_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.naive");
        let mut file = ColumnFile::open(&path).unwrap();
        file.write(&demo_batch()).unwrap();
        let len_before = std::fs::metadata(&path).unwrap().len();

        let schema = Schema::new(vec![ColumnSpec::new("a", ColumnType::Int32)]);
        let bad = RecordBatch::new(schema, vec![Record::new(vec![Value::from("oops")])]).unwrap();
        assert!(matches!(
            file.write(&bad).unwrap_err(),
            StoreError::TypeMismatch { .. }
        ));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), len_before);
    }

    #[test]
    fn scan_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = ColumnFile::open(dir.path().join("demo.naive")).unwrap();
        file.write(&demo_batch()).unwrap();
        file.close().unwrap();
        assert!(file.scan(&["col_int".to_string()]).is_err());
    }
}

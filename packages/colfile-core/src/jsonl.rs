//! Line-delimited JSON backend.
//!
//! The text format is not self-describing: the column set and order are
//! fixed by whoever produced the file, so the caller supplies the schema.
//! Scans are always a single sequential pass; row boundaries are unknown
//! without reading every line, so any parallelism hint is ignored.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use colfile_types::{ColumnType, RecordBatch, Schema, Value};

use crate::error::{io_err, StoreError};
use crate::lock;
use crate::store::{ColumnData, ColumnarStore};

/// Handle to one line-delimited JSON file.
#[derive(Debug)]
pub struct JsonlFile {
    path: PathBuf,
    file: Option<File>,
    schema: Schema,
    lock: Arc<RwLock<()>>,
}

impl JsonlFile {
    /// Opens a jsonl file with the caller-declared schema, creating the
    /// file if missing.
    pub fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| io_err("failed to open jsonl file", e))?;
        let lock = lock::file_lock(&path);
        Ok(Self {
            path,
            file: Some(file),
            schema,
            lock,
        })
    }

    /// Returns the declared schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn file_mut(&mut self) -> Result<&mut File, StoreError> {
        self.file
            .as_mut()
            .ok_or_else(|| StoreError::Io("file handle is closed".to_string()))
    }
}

fn json_to_value(raw: &serde_json::Value, ty: ColumnType, line: usize) -> Result<Value, StoreError> {
    let mismatch = || {
        StoreError::Corruption(format!(
            "line {}: JSON value {} does not fit column type {:?}",
            line, raw, ty
        ))
    };
    match ty {
        ColumnType::Int32 => raw
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int32)
            .ok_or_else(mismatch),
        ColumnType::Int64 => raw.as_i64().map(Value::Int64).ok_or_else(mismatch),
        ColumnType::Uint32 => raw
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Value::Uint32)
            .ok_or_else(mismatch),
        ColumnType::Uint64 => raw.as_u64().map(Value::Uint64).ok_or_else(mismatch),
        ColumnType::Float32 => raw
            .as_f64()
            .map(|v| Value::Float32(v as f32))
            .ok_or_else(mismatch),
        ColumnType::Float64 => raw.as_f64().map(Value::Float64).ok_or_else(mismatch),
        ColumnType::String => raw
            .as_str()
            .map(|v| Value::String(v.to_string()))
            .ok_or_else(mismatch),
        ColumnType::Bool => raw.as_bool().map(Value::Bool).ok_or_else(mismatch),
        ColumnType::NestedList | ColumnType::NestedStruct => {
            Err(StoreError::UnsupportedType(ty))
        }
    }
}

fn value_to_json(value: &Value) -> Result<serde_json::Value, StoreError> {
    let number = |v: f64| {
        serde_json::Number::from_f64(v).ok_or_else(|| {
            StoreError::SchemaMismatch("non-finite float cannot be written as JSON".to_string())
        })
    };
    Ok(match value {
        Value::Int32(v) => serde_json::Value::from(*v),
        Value::Int64(v) => serde_json::Value::from(*v),
        Value::Uint32(v) => serde_json::Value::from(*v),
        Value::Uint64(v) => serde_json::Value::from(*v),
        Value::Float32(v) => serde_json::Value::Number(number(*v as f64)?),
        Value::Float64(v) => serde_json::Value::Number(number(*v)?),
        Value::String(v) => serde_json::Value::from(v.clone()),
        Value::Bool(v) => serde_json::Value::from(*v),
    })
}

impl ColumnarStore for JsonlFile {
    fn scan(&mut self, columns: &[String]) -> Result<Vec<ColumnData>, StoreError> {
        let lock = Arc::clone(&self.lock);
        let _guard = lock.read().map_err(|_| StoreError::LockPoisoned)?;

        // Requested columns the schema knows about, requested order.
        let schema = self.schema.clone();
        let projected: Vec<_> = columns
            .iter()
            .filter_map(|name| schema.column(name).cloned())
            .collect();

        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| io_err("failed to rewind jsonl file", e))?;

        let mut results: Vec<ColumnData> = projected
            .iter()
            .map(|spec| ColumnData {
                name: spec.name.clone(),
                values: Vec::new(),
            })
            .collect();

        let reader = BufReader::new(file);
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| io_err("failed to read jsonl line", e))?;
            if line.trim().is_empty() {
                continue;
            }
            let parsed: serde_json::Value = serde_json::from_str(&line).map_err(|e| {
                StoreError::Corruption(format!("line {}: invalid JSON: {}", line_no, e))
            })?;
            let object = parsed.as_object().ok_or_else(|| {
                StoreError::Corruption(format!("line {}: expected a JSON object", line_no))
            })?;
            for (spec, column) in projected.iter().zip(results.iter_mut()) {
                let raw = object.get(&spec.name).ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "line {}: missing key '{}'",
                        line_no, spec.name
                    ))
                })?;
                column.values.push(json_to_value(raw, spec.ty, line_no)?);
            }
        }
        Ok(results)
    }

    fn write(&mut self, batch: &RecordBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let schema = batch.schema().clone();
        let mut body = String::new();
        for row in batch.rows() {
            let mut object = serde_json::Map::with_capacity(schema.len());
            for (index, spec) in schema.columns().iter().enumerate() {
                let value = row.get(index).ok_or_else(|| {
                    StoreError::SchemaMismatch(format!(
                        "row is missing a value for column '{}'",
                        spec.name
                    ))
                })?;
                object.insert(spec.name.clone(), value_to_json(value)?);
            }
            let line = serde_json::Value::Object(object).to_string();
            body.push_str(&line);
            body.push('\n');
        }

        let lock = Arc::clone(&self.lock);
        let _guard = lock.write().map_err(|_| StoreError::LockPoisoned)?;
        let file = self.file_mut()?;
        file.set_len(0)
            .map_err(|e| io_err("failed to truncate jsonl file", e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| io_err("failed to rewind jsonl file", e))?;
        file.write_all(body.as_bytes())
            .map_err(|e| io_err("failed to write jsonl rows", e))?;
        file.sync_all()
            .map_err(|e| io_err("failed to sync jsonl file", e))?;

        tracing::debug!(
            path = %self.path.display(),
            rows = batch.row_count(),
            "jsonl file written"
        );
        self.schema = schema;
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
    use colfile_types::{ColumnSpec, Record};

    fn demo_schema() -> Schema {
        Schema::new(vec![
            ColumnSpec::new("column_int", ColumnType::Int64),
            ColumnSpec::new("column_float", ColumnType::Float32),
            ColumnSpec::new("column_bool", ColumnType::Bool),
        ])
    }

    #[test]
    fn write_then_scan_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.jsonl");
        let rows = vec![
            Record::new(vec![Value::Int64(1), Value::Float32(0.5), Value::Bool(true)]),
            Record::new(vec![Value::Int64(2), Value::Float32(1.5), Value::Bool(false)]),
        ];
        let batch = RecordBatch::new(demo_schema(), rows).unwrap();

        let mut file = JsonlFile::open(&path, demo_schema()).unwrap();
        file.write(&batch).unwrap();

        let result = file
            .scan(&["column_bool".to_string(), "column_int".to_string()])
            .unwrap();
        assert_eq!(result[0].name, "column_bool");
        assert_eq!(result[0].values, vec![Value::Bool(true), Value::Bool(false)]);
        assert_eq!(result[1].values, vec![Value::Int64(1), Value::Int64(2)]);
    }

    #[test]
    fn unknown_column_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.jsonl");
        std::fs::write(&path, "{\"column_int\": 7, \"column_float\": 0.25, \"column_bool\": false}\n")
            .unwrap();

        let mut file = JsonlFile::open(&path, demo_schema()).unwrap();
        let result = file
            .scan(&["missing".to_string(), "column_int".to_string()])
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].values, vec![Value::Int64(7)]);
    }

    #[test]
    fn missing_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.jsonl");
        std::fs::write(&path, "{\"column_int\": 7}\n").unwrap();

        let mut file = JsonlFile::open(&path, demo_schema()).unwrap();
        let err = file.scan(&["column_bool".to_string()]).unwrap_err();
        assert!(matches!(err, StoreError::Corruption(_)));
    }

    #[test]
    fn malformed_line_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        let mut file = JsonlFile::open(&path, demo_schema()).unwrap();
        let err = file.scan(&["column_int".to_string()]).unwrap_err();
        assert!(matches!(err, StoreError::Corruption(_)));
    }
}

//! Metadata trailer for the naive columnar format.
//!
//! The trailer sits after the column data region and is located by reading a
//! fixed-size length field at the very end of the file, then seeking
//! backward. Layout (all little-endian):
//!
//! ```text
//! [ row_count: u64 ][ column_count: u64 ]
//! [ per column: name (64B, NUL-padded/truncated) | type id (u32) | offset (u64) ]
//! [ metadata_length: u32 ]  -- length of everything above this field
//! ```
//!
//! No magic number or version byte: the layout stays bit-for-bit compatible
//! with the legacy format.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use colfile_types::{ColumnSpec, ColumnType, Schema};

use crate::error::{io_err, StoreError};

/// Bytes reserved for a column name on disk.
pub const COLUMN_NAME_LEN: usize = 64;
/// Size of one serialized column record: name + type id + offset.
pub const COLUMN_RECORD_LEN: usize = COLUMN_NAME_LEN + 4 + 8;
/// Size of the row/column count header.
pub const HEADER_LEN: usize = 16;
/// Size of the trailing length field.
pub const LENGTH_FIELD_LEN: usize = 4;

/// One column's entry in the trailer. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name (at most 64 bytes on disk)
    pub name: String,
    /// Column type
    pub ty: ColumnType,
    /// Byte offset of this column's value stream in the data region
    pub offset: u64,
}

/// Schema descriptor stored in the file trailer.
///
/// Column order is the column index and is load-bearing: offsets are laid
/// out in this order with no padding, so
/// `columns[i + 1].offset == columns[i].offset + stream_len(i)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Number of rows in every column stream
    pub row_count: u64,
    /// Number of columns
    pub column_count: u64,
    /// Column definitions in file order
    pub columns: Vec<ColumnDefinition>,
}

impl Metadata {
    /// Serializes the trailer, including the trailing length field.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(HEADER_LEN + self.columns.len() * COLUMN_RECORD_LEN + LENGTH_FIELD_LEN);
        buf.extend_from_slice(&self.row_count.to_le_bytes());
        buf.extend_from_slice(&self.column_count.to_le_bytes());
        for col in &self.columns {
            let name = col.name.as_bytes();
            let len = name.len().min(COLUMN_NAME_LEN);
            buf.extend_from_slice(&name[..len]);
            buf.extend(std::iter::repeat(0u8).take(COLUMN_NAME_LEN - len));
            buf.extend_from_slice(&col.ty.type_id().to_le_bytes());
            buf.extend_from_slice(&col.offset.to_le_bytes());
        }
        let len = buf.len() as u32;
        buf.extend_from_slice(&len.to_le_bytes());
        buf
    }

    /// Parses a trailer block (without the trailing length field).
    pub fn deserialize(data: &[u8]) -> Result<Self, StoreError> {
        if data.len() < HEADER_LEN {
            return Err(StoreError::Corruption(format!(
                "metadata block of {} bytes is smaller than its {} byte header",
                data.len(),
                HEADER_LEN
            )));
        }
        let row_count = u64::from_le_bytes(data[0..8].try_into().unwrap());
        let column_count = u64::from_le_bytes(data[8..16].try_into().unwrap());

        let expected = HEADER_LEN as u128 + column_count as u128 * COLUMN_RECORD_LEN as u128;
        if (data.len() as u128) < expected {
            return Err(StoreError::Corruption(format!(
                "metadata block of {} bytes cannot hold {} column records",
                data.len(),
                column_count
            )));
        }

        let mut columns = Vec::with_capacity(column_count as usize);
        for i in 0..column_count as usize {
            let base = HEADER_LEN + i * COLUMN_RECORD_LEN;
            let name_raw = &data[base..base + COLUMN_NAME_LEN];
            let name_end = name_raw
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(COLUMN_NAME_LEN);
            let name = String::from_utf8_lossy(&name_raw[..name_end]).into_owned();

            let type_id = u32::from_le_bytes(
                data[base + COLUMN_NAME_LEN..base + COLUMN_NAME_LEN + 4]
                    .try_into()
                    .unwrap(),
            );
            let ty = ColumnType::try_from(type_id).map_err(|id| {
                StoreError::Corruption(format!("unknown column type id {} for column {}", id, i))
            })?;
            let offset = u64::from_le_bytes(
                data[base + COLUMN_NAME_LEN + 4..base + COLUMN_RECORD_LEN]
                    .try_into()
                    .unwrap(),
            );
            columns.push(ColumnDefinition { name, ty, offset });
        }

        Ok(Self {
            row_count,
            column_count,
            columns,
        })
    }

    /// Reads the trailer from an open file by reverse seek.
    ///
    /// A zero-byte file is the valid schema-less state and returns
    /// `Ok(None)`. Any other short or malformed trailer is a corruption
    /// error.
    pub fn read_trailer(file: &mut File) -> Result<Option<Self>, StoreError> {
        let file_len = file
            .metadata()
            .map_err(|e| io_err("failed to stat file", e))?
            .len();
        if file_len == 0 {
            return Ok(None);
        }
        if file_len < LENGTH_FIELD_LEN as u64 {
            return Err(StoreError::Corruption(format!(
                "file of {} bytes is too small for a trailer length field",
                file_len
            )));
        }

        file.seek(SeekFrom::End(-(LENGTH_FIELD_LEN as i64)))
            .map_err(|e| io_err("failed to seek to trailer length field", e))?;
        let mut len_buf = [0u8; LENGTH_FIELD_LEN];
        file.read_exact(&mut len_buf)
            .map_err(|e| io_err("failed to read trailer length field", e))?;
        let metadata_size = u32::from_le_bytes(len_buf) as u64;

        let trailer_len = metadata_size + LENGTH_FIELD_LEN as u64;
        if trailer_len > file_len {
            return Err(StoreError::Corruption(format!(
                "trailer of {} bytes exceeds file of {} bytes",
                trailer_len, file_len
            )));
        }

        file.seek(SeekFrom::End(-(trailer_len as i64)))
            .map_err(|e| io_err("failed to seek to metadata block", e))?;
        let mut block = vec![0u8; metadata_size as usize];
        file.read_exact(&mut block)
            .map_err(|e| io_err("failed to read metadata block", e))?;

        Metadata::deserialize(&block).map(Some)
    }

    /// Returns the column definition with the given name, if any.
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the file-schema index of the named column, if any.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Converts the stored column list into a caller-facing schema.
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| ColumnSpec::new(c.name.clone(), c.ty))
                .collect(),
        )
    }
}

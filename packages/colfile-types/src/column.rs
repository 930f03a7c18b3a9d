//! Column type tags and schema descriptors.

use serde::{Deserialize, Serialize};

/// Column type tags stored in file metadata.
///
/// The integer encoding is part of the on-disk format and must stay stable.
/// `NestedList` and `NestedStruct` are reserved ids; they can appear in a
/// schema but no codec exists for them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ColumnType {
    /// 32-bit signed integer
    Int32 = 0,
    /// 64-bit signed integer
    Int64 = 1,
    /// 32-bit unsigned integer
    Uint32 = 2,
    /// 64-bit unsigned integer
    Uint64 = 3,
    /// 32-bit IEEE-754 float
    Float32 = 4,
    /// 64-bit IEEE-754 float
    Float64 = 5,
    /// UTF-8 string, length-prefixed on disk
    String = 6,
    /// Single byte boolean
    Bool = 7,
    /// Reserved, not implemented
    NestedList = 8,
    /// Reserved, not implemented
    NestedStruct = 9,
}

impl ColumnType {
    /// Returns the stable on-disk type id.
    pub fn type_id(&self) -> u32 {
        *self as u32
    }

    /// Returns the fixed encoded width in bytes, or `None` for
    /// variable-length and reserved types.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            ColumnType::Int32 | ColumnType::Uint32 | ColumnType::Float32 => Some(4),
            ColumnType::Int64 | ColumnType::Uint64 | ColumnType::Float64 => Some(8),
            ColumnType::Bool => Some(1),
            ColumnType::String | ColumnType::NestedList | ColumnType::NestedStruct => None,
        }
    }

    /// Whether a codec exists for this type.
    pub fn is_supported(&self) -> bool {
        !matches!(self, ColumnType::NestedList | ColumnType::NestedStruct)
    }
}

impl TryFrom<u32> for ColumnType {
    type Error = u32;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(ColumnType::Int32),
            1 => Ok(ColumnType::Int64),
            2 => Ok(ColumnType::Uint32),
            3 => Ok(ColumnType::Uint64),
            4 => Ok(ColumnType::Float32),
            5 => Ok(ColumnType::Float64),
            6 => Ok(ColumnType::String),
            7 => Ok(ColumnType::Bool),
            8 => Ok(ColumnType::NestedList),
            9 => Ok(ColumnType::NestedStruct),
            other => Err(other),
        }
    }
}

/// A named, typed column in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// Column type
    pub ty: ColumnType,
}

impl ColumnSpec {
    /// Creates a new column spec.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Ordered column schema supplied by the caller.
///
/// Column order is load-bearing: it determines the on-disk stream order and
/// the column index used when reassembling parallel scan results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Creates a schema from an ordered column list.
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Returns the columns in declaration order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the index of the named column, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns the named column's spec, if present.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

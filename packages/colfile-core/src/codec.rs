//! Per-type value codec for the naive columnar format.
//!
//! Fixed-width numerics are little-endian with native two's-complement /
//! IEEE-754 bit patterns. Strings carry a `u16` little-endian length prefix.
//! Bools are one byte: the encoder emits only `0x00`/`0x01`, but the decoder
//! accepts any non-zero byte as true. That asymmetry is deliberate tolerance
//! inherited from the format and must not be "fixed".

use colfile_types::{ColumnType, Value};

use crate::error::StoreError;

/// Longest string payload the format can address with its u16 length prefix.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Encodes one value into `out`.
///
/// Strings longer than [`MAX_STRING_LEN`] bytes are silently truncated.
/// Returns a recoverable [`StoreError::TypeMismatch`] if the value's variant
/// does not match `ty`.
pub fn encode_value(value: &Value, ty: ColumnType, out: &mut Vec<u8>) -> Result<(), StoreError> {
    if !ty.is_supported() {
        return Err(StoreError::UnsupportedType(ty));
    }
    if value.column_type() != ty {
        return Err(StoreError::TypeMismatch {
            expected: ty,
            got: value.column_type(),
        });
    }
    match value {
        Value::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Uint32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Uint64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Float32(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::Float64(v) => out.extend_from_slice(&v.to_le_bytes()),
        Value::String(v) => {
            let bytes = v.as_bytes();
            let len = bytes.len().min(MAX_STRING_LEN);
            out.extend_from_slice(&(len as u16).to_le_bytes());
            out.extend_from_slice(&bytes[..len]);
        }
        Value::Bool(v) => out.push(if *v { 0x01 } else { 0x00 }),
    }
    Ok(())
}

/// Decodes one value of type `ty` from the front of `buf`.
///
/// Returns the value and the number of bytes consumed. A span shorter than
/// the type requires is fatal [`StoreError::Corruption`]: offsets are
/// trusted, so a short read means the file or its offset table is damaged.
pub fn decode_value(buf: &[u8], ty: ColumnType) -> Result<(Value, usize), StoreError> {
    match ty {
        ColumnType::Int32 => {
            let raw = fixed::<4>(buf, ty)?;
            Ok((Value::Int32(i32::from_le_bytes(raw)), 4))
        }
        ColumnType::Int64 => {
            let raw = fixed::<8>(buf, ty)?;
            Ok((Value::Int64(i64::from_le_bytes(raw)), 8))
        }
        ColumnType::Uint32 => {
            let raw = fixed::<4>(buf, ty)?;
            Ok((Value::Uint32(u32::from_le_bytes(raw)), 4))
        }
        ColumnType::Uint64 => {
            let raw = fixed::<8>(buf, ty)?;
            Ok((Value::Uint64(u64::from_le_bytes(raw)), 8))
        }
        ColumnType::Float32 => {
            let raw = fixed::<4>(buf, ty)?;
            Ok((Value::Float32(f32::from_le_bytes(raw)), 4))
        }
        ColumnType::Float64 => {
            let raw = fixed::<8>(buf, ty)?;
            Ok((Value::Float64(f64::from_le_bytes(raw)), 8))
        }
        ColumnType::Bool => {
            let raw = fixed::<1>(buf, ty)?;
            Ok((Value::Bool(raw[0] != 0x00), 1))
        }
        ColumnType::String => {
            let prefix = fixed::<2>(buf, ty)?;
            let len = u16::from_le_bytes(prefix) as usize;
            let body = buf.get(2..2 + len).ok_or_else(|| {
                StoreError::Corruption(format!(
                    "string length prefix {} exceeds remaining {} bytes",
                    len,
                    buf.len().saturating_sub(2)
                ))
            })?;
            // Truncation at encode time may have split a code point.
            let text = String::from_utf8_lossy(body).into_owned();
            Ok((Value::String(text), 2 + len))
        }
        ColumnType::NestedList | ColumnType::NestedStruct => Err(StoreError::UnsupportedType(ty)),
    }
}

fn fixed<const N: usize>(buf: &[u8], ty: ColumnType) -> Result<[u8; N], StoreError> {
    let span = buf.get(..N).ok_or_else(|| {
        StoreError::Corruption(format!(
            "need {} bytes for {:?}, found {}",
            N,
            ty,
            buf.len()
        ))
    })?;
    let mut raw = [0u8; N];
    raw.copy_from_slice(span);
    Ok(raw)
}

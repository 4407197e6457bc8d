//! # Numeric and String Conversion Matrix
//!
//! Three conversion directions between document scalars and column widths:
//!
//! 1. **Document scalar → column width** (encode): integers narrow with a
//!    wrapping cast and widen value-preserving; doubles clamp at the target
//!    bounds before a truncating cast. Numeric values can also be stored as
//!    decimal text in `StrZero` and `Binary` columns.
//! 2. **Textual scalar → column width** (encode): base-10 parse that must
//!    consume the entire string.
//! 3. **Column width → document numeric** (decode): the stored scalar is
//!    loaded at its declared width and clamped into the target type when the
//!    target is integral and the source is wider or a float.
//!
//! `Float128` is reserved and rejected everywhere.

use crate::encoding::Reader;
use crate::error::CodecError;
use crate::records::schema::ColumnType;
use eyre::{bail, ensure, Result};

/// Upper bound (exclusive) on the decimal text length a `Binary` column may
/// hold, so the one-byte length prefix stays a single var-uint byte.
const BINARY_TEXT_MAX: usize = 127;

/// Encodes an integer document scalar into `col`. Narrowing casts wrap,
/// matching two's-complement truncation; float targets use the standard
/// numeric conversion.
pub(crate) fn encode_int(
    col: ColumnType,
    x: i64,
    out: &mut Vec<u8>,
    is_last_field: bool,
) -> Result<()> {
    match col {
        ColumnType::Sint08 => out.push(x as i8 as u8),
        ColumnType::Uint08 => out.push(x as u8),
        ColumnType::Sint16 => out.extend_from_slice(&(x as i16).to_le_bytes()),
        ColumnType::Uint16 => out.extend_from_slice(&(x as u16).to_le_bytes()),
        ColumnType::Sint32 => out.extend_from_slice(&(x as i32).to_le_bytes()),
        ColumnType::Uint32 => out.extend_from_slice(&(x as u32).to_le_bytes()),
        ColumnType::Sint64 => out.extend_from_slice(&x.to_le_bytes()),
        ColumnType::Uint64 => out.extend_from_slice(&(x as u64).to_le_bytes()),
        ColumnType::Float32 => out.extend_from_slice(&(x as f32).to_le_bytes()),
        ColumnType::Float64 => out.extend_from_slice(&(x as f64).to_le_bytes()),
        ColumnType::Float128 => bail!(CodecError::UnsupportedConversion(
            "Float128 is reserved".into()
        )),
        ColumnType::StrZero => push_text(&x.to_string(), false, out, is_last_field)?,
        ColumnType::Binary => push_text(&x.to_string(), true, out, is_last_field)?,
        _ => bail!(CodecError::SchemaMismatch(format!(
            "integer value cannot be stored in a {:?} column",
            col
        ))),
    }
    Ok(())
}

/// Encodes a double document scalar into `col`. Integral targets clamp at
/// their bounds and truncate toward zero (the `as` cast's saturating
/// behavior is exactly the required clamp, including for infinities).
pub(crate) fn encode_double(
    col: ColumnType,
    x: f64,
    out: &mut Vec<u8>,
    is_last_field: bool,
) -> Result<()> {
    match col {
        ColumnType::Sint08 => out.push((x as i8) as u8),
        ColumnType::Uint08 => out.push(x as u8),
        ColumnType::Sint16 => out.extend_from_slice(&(x as i16).to_le_bytes()),
        ColumnType::Uint16 => out.extend_from_slice(&(x as u16).to_le_bytes()),
        ColumnType::Sint32 => out.extend_from_slice(&(x as i32).to_le_bytes()),
        ColumnType::Uint32 => out.extend_from_slice(&(x as u32).to_le_bytes()),
        ColumnType::Sint64 => out.extend_from_slice(&(x as i64).to_le_bytes()),
        ColumnType::Uint64 => out.extend_from_slice(&(x as u64).to_le_bytes()),
        ColumnType::Float32 => out.extend_from_slice(&(x as f32).to_le_bytes()),
        ColumnType::Float64 => out.extend_from_slice(&x.to_le_bytes()),
        ColumnType::Float128 => bail!(CodecError::UnsupportedConversion(
            "Float128 is reserved".into()
        )),
        ColumnType::StrZero => push_text(&x.to_string(), false, out, is_last_field)?,
        ColumnType::Binary => push_text(&x.to_string(), true, out, is_last_field)?,
        _ => bail!(CodecError::SchemaMismatch(format!(
            "double value cannot be stored in a {:?} column",
            col
        ))),
    }
    Ok(())
}

/// Encodes a textual document scalar into a numeric column. The whole
/// string must parse; trailing garbage is an error.
pub(crate) fn encode_str(col: ColumnType, s: &str, out: &mut Vec<u8>) -> Result<()> {
    match col {
        ColumnType::Sint08 => out.push(parse_i64(s)? as i8 as u8),
        ColumnType::Uint08 => out.push(parse_u64(s)? as u8),
        ColumnType::Sint16 => out.extend_from_slice(&(parse_i64(s)? as i16).to_le_bytes()),
        ColumnType::Uint16 => out.extend_from_slice(&(parse_u64(s)? as u16).to_le_bytes()),
        ColumnType::Sint32 => out.extend_from_slice(&(parse_i64(s)? as i32).to_le_bytes()),
        ColumnType::Uint32 => out.extend_from_slice(&(parse_u64(s)? as u32).to_le_bytes()),
        ColumnType::Sint64 => out.extend_from_slice(&parse_i64(s)?.to_le_bytes()),
        ColumnType::Uint64 => out.extend_from_slice(&parse_u64(s)?.to_le_bytes()),
        ColumnType::Float32 => {
            let x: f32 = s.parse().map_err(|_| not_a_number(s))?;
            out.extend_from_slice(&x.to_le_bytes());
        }
        ColumnType::Float64 => {
            let x: f64 = s.parse().map_err(|_| not_a_number(s))?;
            out.extend_from_slice(&x.to_le_bytes());
        }
        ColumnType::Float128 => bail!(CodecError::UnsupportedConversion(
            "Float128 is reserved".into()
        )),
        _ => bail!(CodecError::SchemaMismatch(format!(
            "string value cannot be converted into a {:?} column",
            col
        ))),
    }
    Ok(())
}

fn parse_i64(s: &str) -> Result<i64> {
    s.parse::<i64>().map_err(|_| not_a_number(s))
}

fn parse_u64(s: &str) -> Result<u64> {
    s.parse::<u64>().map_err(|_| not_a_number(s))
}

fn not_a_number(s: &str) -> eyre::Report {
    CodecError::InvalidArgument(format!("string is not a number: {:?}", s)).into()
}

/// Appends decimal text for a `StrZero` or `Binary` column. `Binary` text
/// always carries its NUL and, when the column is not last, a one-byte
/// length prefix of `len + 1`; `StrZero` elides the NUL on the last column.
fn push_text(text: &str, binary: bool, out: &mut Vec<u8>, is_last_field: bool) -> Result<()> {
    if binary {
        ensure!(
            text.len() < BINARY_TEXT_MAX,
            CodecError::InvalidArgument(format!(
                "numeric text of {} bytes does not fit a binary column",
                text.len()
            ))
        );
        if !is_last_field {
            out.push((text.len() + 1) as u8);
        }
        out.extend_from_slice(text.as_bytes());
        out.push(0);
    } else {
        out.extend_from_slice(text.as_bytes());
        if !is_last_field {
            out.push(0);
        }
    }
    Ok(())
}

/// A scalar loaded from storage at its declared column width.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Stored {
    I64(i64),
    U64(u64),
    F64(f64),
}

/// Loads one scalar of `col`'s width from the input.
pub(crate) fn read_stored(col: ColumnType, r: &mut Reader<'_>) -> Result<Stored> {
    Ok(match col {
        ColumnType::Sint08 => Stored::I64(r.read_u8()? as i8 as i64),
        ColumnType::Uint08 => Stored::U64(r.read_u8()? as u64),
        ColumnType::Sint16 => Stored::I64(r.read_i16_le()? as i64),
        ColumnType::Uint16 => Stored::U64(r.read_u16_le()? as u64),
        ColumnType::Sint32 => Stored::I64(r.read_i32_le()? as i64),
        ColumnType::Uint32 => Stored::U64(r.read_u32_le()? as u64),
        ColumnType::Sint64 => Stored::I64(r.read_i64_le()?),
        ColumnType::Uint64 => Stored::U64(r.read_u64_le()?),
        ColumnType::Float32 => Stored::F64(r.read_f32_le()? as f64),
        ColumnType::Float64 => Stored::F64(r.read_f64_le()?),
        ColumnType::Float128 => bail!(CodecError::UnsupportedConversion(
            "Float128 is reserved".into()
        )),
        _ => bail!(CodecError::SchemaMismatch(format!(
            "{:?} column does not hold a numeric scalar",
            col
        ))),
    })
}

pub(crate) fn stored_to_i32(s: Stored) -> i32 {
    match s {
        Stored::I64(v) => v.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        Stored::U64(v) => v.min(i32::MAX as u64) as i32,
        Stored::F64(x) => x as i32,
    }
}

pub(crate) fn stored_to_i64(s: Stored) -> i64 {
    match s {
        Stored::I64(v) => v,
        Stored::U64(v) => v.min(i64::MAX as u64) as i64,
        Stored::F64(x) => x as i64,
    }
}

pub(crate) fn stored_to_f64(s: Stored) -> f64 {
    match s {
        Stored::I64(v) => v as f64,
        Stored::U64(v) => v as f64,
        Stored::F64(x) => x,
    }
}

pub(crate) fn stored_to_bool(s: Stored) -> bool {
    match s {
        Stored::I64(v) => v != 0,
        Stored::U64(v) => v != 0,
        Stored::F64(x) => x != 0.0,
    }
}

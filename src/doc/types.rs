//! # Document Element Types
//!
//! One-byte type tags for document elements. The numeric values are fixed by
//! the wire format and must never change.

use crate::error::CodecError;
use eyre::{bail, Result};

/// Size of an ObjectId payload in bytes.
pub const OID_SIZE: usize = 12;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemType {
    /// End-of-object terminator; never a real element.
    Eoo = 0x00,
    Double = 0x01,
    String = 0x02,
    Object = 0x03,
    Array = 0x04,
    BinData = 0x05,
    Undefined = 0x06,
    ObjectId = 0x07,
    Bool = 0x08,
    /// Milliseconds since the epoch, signed 64-bit.
    Date = 0x09,
    Null = 0x0A,
    RegEx = 0x0B,
    DbRef = 0x0C,
    Code = 0x0D,
    Symbol = 0x0E,
    CodeWScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl ElemType {
    pub fn from_u8(tag: u8) -> Result<Self> {
        Ok(match tag {
            0x00 => ElemType::Eoo,
            0x01 => ElemType::Double,
            0x02 => ElemType::String,
            0x03 => ElemType::Object,
            0x04 => ElemType::Array,
            0x05 => ElemType::BinData,
            0x06 => ElemType::Undefined,
            0x07 => ElemType::ObjectId,
            0x08 => ElemType::Bool,
            0x09 => ElemType::Date,
            0x0A => ElemType::Null,
            0x0B => ElemType::RegEx,
            0x0C => ElemType::DbRef,
            0x0D => ElemType::Code,
            0x0E => ElemType::Symbol,
            0x0F => ElemType::CodeWScope,
            0x10 => ElemType::Int32,
            0x11 => ElemType::Timestamp,
            0x12 => ElemType::Int64,
            0x7F => ElemType::MaxKey,
            0xFF => ElemType::MinKey,
            _ => bail!(CodecError::InvalidEncoding(format!(
                "bad element type tag: 0x{:02X}",
                tag
            ))),
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for tags with no value bytes at all.
    pub fn is_empty_value(self) -> bool {
        matches!(
            self,
            ElemType::Eoo
                | ElemType::Undefined
                | ElemType::Null
                | ElemType::MinKey
                | ElemType::MaxKey
        )
    }
}

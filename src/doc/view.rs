//! # Zero-Copy Document Access
//!
//! `DocView` wraps the raw bytes of one document and iterates its elements
//! without copying. Each element is `tag (1B) | name (NUL-terminated) |
//! value`, where the value length is fixed by the tag; the document itself
//! is `i32 LE total length | elements | 0x00`.
//!
//! All accessors return references into the underlying buffer. Iteration
//! yields `Result` items because payload lengths come from the data and a
//! corrupt length must surface as an error, not a panic.

use crate::doc::types::{ElemType, OID_SIZE};
use crate::error::CodecError;
use eyre::{ensure, Result};

#[derive(Debug, Clone, Copy)]
pub struct DocView<'a> {
    data: &'a [u8],
}

impl<'a> DocView<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        ensure!(
            data.len() >= 5,
            CodecError::InvalidEncoding(format!("document too short: {} bytes", data.len()))
        );
        let declared = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        ensure!(
            declared as usize == data.len(),
            CodecError::InvalidEncoding(format!(
                "document length prefix {} does not match buffer length {}",
                declared,
                data.len()
            ))
        );
        ensure!(
            data[data.len() - 1] == 0,
            CodecError::InvalidEncoding("document missing end-of-object terminator".into())
        );
        Ok(Self { data })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// True for the five-byte document with no elements.
    pub fn is_empty(&self) -> bool {
        self.data.len() == 5
    }

    pub fn iter(&self) -> DocIter<'a> {
        DocIter {
            data: self.data,
            pos: 4,
        }
    }
}

impl<'a> IntoIterator for &DocView<'a> {
    type Item = Result<DocElem<'a>>;
    type IntoIter = DocIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DocElem<'a> {
    etype: ElemType,
    name: &'a str,
    value: &'a [u8],
}

impl<'a> DocElem<'a> {
    pub fn elem_type(&self) -> ElemType {
        self.etype
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Raw value bytes, exactly as framed in the document.
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    pub fn as_bool(&self) -> Result<bool> {
        ensure!(
            self.value.len() == 1,
            CodecError::InvalidEncoding("bool value must be one byte".into())
        );
        Ok(self.value[0] != 0)
    }

    pub fn as_i32(&self) -> Result<i32> {
        let b: [u8; 4] = self
            .value
            .try_into()
            .map_err(|_| CodecError::InvalidEncoding("int32 value must be four bytes".into()))?;
        Ok(i32::from_le_bytes(b))
    }

    /// Int64, Date (milliseconds), and Timestamp share this 8-byte load.
    pub fn as_i64(&self) -> Result<i64> {
        let b: [u8; 8] = self
            .value
            .try_into()
            .map_err(|_| CodecError::InvalidEncoding("int64 value must be eight bytes".into()))?;
        Ok(i64::from_le_bytes(b))
    }

    pub fn as_f64(&self) -> Result<f64> {
        let b: [u8; 8] = self
            .value
            .try_into()
            .map_err(|_| CodecError::InvalidEncoding("double value must be eight bytes".into()))?;
        Ok(f64::from_le_bytes(b))
    }

    /// String payload length from the prefix, including the trailing NUL.
    pub fn str_size(&self) -> Result<usize> {
        ensure!(
            self.value.len() >= 4,
            CodecError::InvalidEncoding("string value missing length prefix".into())
        );
        let len = i32::from_le_bytes([self.value[0], self.value[1], self.value[2], self.value[3]]);
        ensure!(
            len >= 1 && 4 + len as usize <= self.value.len(),
            CodecError::InvalidEncoding(format!("bad string length: {}", len))
        );
        Ok(len as usize)
    }

    /// String payload after the length prefix, including the trailing NUL.
    pub fn str_data(&self) -> Result<&'a [u8]> {
        let len = self.str_size()?;
        Ok(&self.value[4..4 + len])
    }

    pub fn str_text(&self) -> Result<&'a str> {
        let data = self.str_data()?;
        std::str::from_utf8(&data[..data.len() - 1])
            .map_err(|e| CodecError::InvalidEncoding(format!("string is not UTF-8: {}", e)).into())
    }

    /// Nested document for Object and Array elements.
    pub fn embedded_doc(&self) -> Result<DocView<'a>> {
        DocView::new(self.value)
    }

    /// Subtype byte and payload of a BinData element.
    pub fn bin_data(&self) -> Result<(u8, &'a [u8])> {
        ensure!(
            self.value.len() >= 5,
            CodecError::InvalidEncoding("binary value too short".into())
        );
        let len = i32::from_le_bytes([self.value[0], self.value[1], self.value[2], self.value[3]]);
        ensure!(
            len >= 0 && 5 + len as usize <= self.value.len(),
            CodecError::InvalidEncoding(format!("bad binary length: {}", len))
        );
        Ok((self.value[4], &self.value[5..5 + len as usize]))
    }

    /// Pattern and options of a RegEx element, without their terminators.
    pub fn regex_parts(&self) -> Result<(&'a [u8], &'a [u8])> {
        let nul1 = find_nul(self.value)?;
        let rest = &self.value[nul1 + 1..];
        let nul2 = find_nul(rest)?;
        Ok((&self.value[..nul1], &rest[..nul2]))
    }

    /// Code string bytes (length-field value and bytes including NUL) and
    /// the scope document of a CodeWScope element.
    pub fn code_w_scope(&self) -> Result<(u32, &'a [u8], DocView<'a>)> {
        ensure!(
            self.value.len() >= 8,
            CodecError::InvalidEncoding("code-with-scope value too short".into())
        );
        let total = i32::from_le_bytes([self.value[0], self.value[1], self.value[2], self.value[3]]);
        ensure!(
            total as usize == self.value.len(),
            CodecError::InvalidEncoding("code-with-scope length mismatch".into())
        );
        let code_len =
            i32::from_le_bytes([self.value[4], self.value[5], self.value[6], self.value[7]]);
        ensure!(
            code_len >= 1 && 8 + code_len as usize <= self.value.len(),
            CodecError::InvalidEncoding(format!("bad code length: {}", code_len))
        );
        let code = &self.value[8..8 + code_len as usize];
        let scope = DocView::new(&self.value[8 + code_len as usize..])?;
        Ok((code_len as u32, code, scope))
    }

    /// Namespace string (including NUL) and ObjectId of a DbRef element.
    pub fn dbref_parts(&self) -> Result<(&'a [u8], &'a [u8])> {
        ensure!(
            self.value.len() >= 4,
            CodecError::InvalidEncoding("dbref value too short".into())
        );
        let len = i32::from_le_bytes([self.value[0], self.value[1], self.value[2], self.value[3]]);
        ensure!(
            len >= 1 && 4 + len as usize + OID_SIZE <= self.value.len(),
            CodecError::InvalidEncoding(format!("bad dbref length: {}", len))
        );
        let ns = &self.value[4..4 + len as usize];
        let oid = &self.value[4 + len as usize..4 + len as usize + OID_SIZE];
        Ok((ns, oid))
    }

    /// Numeric interpretation used by the relaxed field comparison; matches
    /// the document model's convention of 0 for non-numeric elements.
    pub fn numeric_as_f64(&self) -> Result<f64> {
        Ok(match self.etype {
            ElemType::Double => self.as_f64()?,
            ElemType::Int32 => self.as_i32()? as f64,
            ElemType::Int64 => self.as_i64()? as f64,
            ElemType::Bool => {
                if self.as_bool()? {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        })
    }
}

pub struct DocIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for DocIter<'a> {
    type Item = Result<DocElem<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let tag = self.data[self.pos];
        if tag == 0 {
            return None;
        }
        match self.parse_at(tag) {
            Ok(elem) => Some(Ok(elem)),
            Err(e) => {
                // poison the iterator so a corrupt element is reported once
                self.pos = self.data.len();
                Some(Err(e))
            }
        }
    }
}

impl<'a> DocIter<'a> {
    fn parse_at(&mut self, tag: u8) -> Result<DocElem<'a>> {
        let etype = ElemType::from_u8(tag)?;
        let rest = &self.data[self.pos + 1..];
        let nul = find_nul(rest)?;
        let name = std::str::from_utf8(&rest[..nul])
            .map_err(|e| CodecError::InvalidEncoding(format!("field name is not UTF-8: {}", e)))?;
        let value_start = self.pos + 1 + nul + 1;
        let value_rest = &self.data[value_start..];
        let value_len = element_value_len(etype, value_rest)?;
        let value = &value_rest[..value_len];
        self.pos = value_start + value_len;
        Ok(DocElem { etype, name, value })
    }
}

fn find_nul(buf: &[u8]) -> Result<usize> {
    buf.iter().position(|&b| b == 0).ok_or_else(|| {
        eyre::Report::new(CodecError::InvalidEncoding(
            "unterminated string in document".into(),
        ))
    })
}

/// Value byte length for an element of type `etype` whose value starts at
/// `rest[0]`. Lengths derived from the data are bounds-checked against the
/// remaining bytes.
fn element_value_len(etype: ElemType, rest: &[u8]) -> Result<usize> {
    fn fit(n: usize, rest: &[u8]) -> Result<usize> {
        ensure!(
            n <= rest.len(),
            CodecError::InvalidEncoding(format!(
                "element value of {} bytes overruns document ({} remaining)",
                n,
                rest.len()
            ))
        );
        Ok(n)
    }
    fn len_prefix(rest: &[u8]) -> Result<i32> {
        ensure!(
            rest.len() >= 4,
            CodecError::InvalidEncoding("element missing length prefix".into())
        );
        Ok(i32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]))
    }

    match etype {
        ElemType::Eoo
        | ElemType::Undefined
        | ElemType::Null
        | ElemType::MinKey
        | ElemType::MaxKey => Ok(0),
        ElemType::Bool => fit(1, rest),
        ElemType::Int32 => fit(4, rest),
        ElemType::Double | ElemType::Date | ElemType::Timestamp | ElemType::Int64 => fit(8, rest),
        ElemType::ObjectId => fit(OID_SIZE, rest),
        ElemType::String | ElemType::Symbol | ElemType::Code => {
            let len = len_prefix(rest)?;
            ensure!(
                len >= 1,
                CodecError::InvalidEncoding(format!("bad string length: {}", len))
            );
            fit(4 + len as usize, rest)
        }
        ElemType::Object | ElemType::Array => {
            let len = len_prefix(rest)?;
            ensure!(
                len >= 5,
                CodecError::InvalidEncoding(format!("bad nested document length: {}", len))
            );
            fit(len as usize, rest)
        }
        ElemType::BinData => {
            let len = len_prefix(rest)?;
            ensure!(
                len >= 0,
                CodecError::InvalidEncoding(format!("bad binary length: {}", len))
            );
            fit(4 + 1 + len as usize, rest)
        }
        ElemType::DbRef => {
            let len = len_prefix(rest)?;
            ensure!(
                len >= 1,
                CodecError::InvalidEncoding(format!("bad dbref length: {}", len))
            );
            fit(4 + len as usize + OID_SIZE, rest)
        }
        ElemType::CodeWScope => {
            let len = len_prefix(rest)?;
            ensure!(
                len >= 14,
                CodecError::InvalidEncoding(format!("bad code-with-scope length: {}", len))
            );
            fit(len as usize, rest)
        }
        ElemType::RegEx => {
            let nul1 = find_nul(rest)?;
            let nul2 = find_nul(&rest[nul1 + 1..])?;
            Ok(nul1 + 1 + nul2 + 1)
        }
    }
}

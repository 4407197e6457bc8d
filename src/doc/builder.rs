//! # Document Builder
//!
//! `DocBuilder` constructs valid document byte buffers element by element.
//! The 4-byte length prefix is reserved up front and patched in `finish()`,
//! which also appends the end-of-object terminator.
//!
//! Nested objects and arrays are appended as finished byte buffers, so deep
//! structures are built bottom-up:
//!
//! ```ignore
//! let mut inner = DocBuilder::new();
//! inner.append_i32("x", 1);
//! let mut outer = DocBuilder::new();
//! outer.append_object("nested", &inner.finish());
//! let doc = outer.finish();
//! ```

use crate::doc::types::{ElemType, OID_SIZE};

#[derive(Debug)]
pub struct DocBuilder {
    buf: Vec<u8>,
}

impl Default for DocBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocBuilder {
    pub fn new() -> Self {
        Self {
            buf: vec![0, 0, 0, 0],
        }
    }

    fn header(&mut self, etype: ElemType, name: &str) {
        self.buf.push(etype.as_u8());
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(0);
    }

    pub fn append_f64(&mut self, name: &str, v: f64) -> &mut Self {
        self.header(ElemType::Double, name);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn append_str(&mut self, name: &str, v: &str) -> &mut Self {
        self.header(ElemType::String, name);
        self.append_len_prefixed_str(v);
        self
    }

    pub fn append_symbol(&mut self, name: &str, v: &str) -> &mut Self {
        self.header(ElemType::Symbol, name);
        self.append_len_prefixed_str(v);
        self
    }

    pub fn append_code(&mut self, name: &str, v: &str) -> &mut Self {
        self.header(ElemType::Code, name);
        self.append_len_prefixed_str(v);
        self
    }

    /// Appends a finished document buffer as a nested object.
    pub fn append_object(&mut self, name: &str, doc: &[u8]) -> &mut Self {
        self.header(ElemType::Object, name);
        self.buf.extend_from_slice(doc);
        self
    }

    /// Appends a finished document buffer as an array; its field names
    /// should be "0", "1", ….
    pub fn append_array(&mut self, name: &str, doc: &[u8]) -> &mut Self {
        self.header(ElemType::Array, name);
        self.buf.extend_from_slice(doc);
        self
    }

    pub fn append_bin_data(&mut self, name: &str, subtype: u8, data: &[u8]) -> &mut Self {
        self.header(ElemType::BinData, name);
        self.buf.extend_from_slice(&(data.len() as i32).to_le_bytes());
        self.buf.push(subtype);
        self.buf.extend_from_slice(data);
        self
    }

    pub fn append_undefined(&mut self, name: &str) -> &mut Self {
        self.header(ElemType::Undefined, name);
        self
    }

    pub fn append_object_id(&mut self, name: &str, oid: &[u8; OID_SIZE]) -> &mut Self {
        self.header(ElemType::ObjectId, name);
        self.buf.extend_from_slice(oid);
        self
    }

    pub fn append_bool(&mut self, name: &str, v: bool) -> &mut Self {
        self.header(ElemType::Bool, name);
        self.buf.push(v as u8);
        self
    }

    /// Milliseconds since the epoch.
    pub fn append_date_ms(&mut self, name: &str, millis: i64) -> &mut Self {
        self.header(ElemType::Date, name);
        self.buf.extend_from_slice(&millis.to_le_bytes());
        self
    }

    pub fn append_null(&mut self, name: &str) -> &mut Self {
        self.header(ElemType::Null, name);
        self
    }

    pub fn append_regex(&mut self, name: &str, pattern: &str, options: &str) -> &mut Self {
        self.header(ElemType::RegEx, name);
        self.buf.extend_from_slice(pattern.as_bytes());
        self.buf.push(0);
        self.buf.extend_from_slice(options.as_bytes());
        self.buf.push(0);
        self
    }

    pub fn append_dbref(&mut self, name: &str, ns: &str, oid: &[u8; OID_SIZE]) -> &mut Self {
        self.header(ElemType::DbRef, name);
        self.append_len_prefixed_str(ns);
        self.buf.extend_from_slice(oid);
        self
    }

    /// Appends code with a scope object (a finished document buffer).
    pub fn append_code_w_scope(&mut self, name: &str, code: &str, scope: &[u8]) -> &mut Self {
        self.header(ElemType::CodeWScope, name);
        let total = 4 + 4 + code.len() + 1 + scope.len();
        self.buf.extend_from_slice(&(total as i32).to_le_bytes());
        self.append_len_prefixed_str(code);
        self.buf.extend_from_slice(scope);
        self
    }

    pub fn append_i32(&mut self, name: &str, v: i32) -> &mut Self {
        self.header(ElemType::Int32, name);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn append_timestamp(&mut self, name: &str, v: u64) -> &mut Self {
        self.header(ElemType::Timestamp, name);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn append_i64(&mut self, name: &str, v: i64) -> &mut Self {
        self.header(ElemType::Int64, name);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn append_min_key(&mut self, name: &str) -> &mut Self {
        self.header(ElemType::MinKey, name);
        self
    }

    pub fn append_max_key(&mut self, name: &str) -> &mut Self {
        self.header(ElemType::MaxKey, name);
        self
    }

    fn append_len_prefixed_str(&mut self, v: &str) {
        self.buf
            .extend_from_slice(&((v.len() + 1) as i32).to_le_bytes());
        self.buf.extend_from_slice(v.as_bytes());
        self.buf.push(0);
    }

    /// Terminates the document and patches the length prefix.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(0);
        let len = self.buf.len() as i32;
        self.buf[0..4].copy_from_slice(&len.to_le_bytes());
        self.buf
    }
}

/// Builds an array document: a regular document whose field names are the
/// decimal indices "0", "1", … assigned in push order.
#[derive(Debug, Default)]
pub struct ArrayBuilder {
    inner: DocBuilder,
    next: usize,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        Self {
            inner: DocBuilder::new(),
            next: 0,
        }
    }

    fn name(&mut self) -> String {
        let s = self.next.to_string();
        self.next += 1;
        s
    }

    pub fn push_i32(&mut self, v: i32) -> &mut Self {
        let n = self.name();
        self.inner.append_i32(&n, v);
        self
    }

    pub fn push_i64(&mut self, v: i64) -> &mut Self {
        let n = self.name();
        self.inner.append_i64(&n, v);
        self
    }

    pub fn push_f64(&mut self, v: f64) -> &mut Self {
        let n = self.name();
        self.inner.append_f64(&n, v);
        self
    }

    pub fn push_str(&mut self, v: &str) -> &mut Self {
        let n = self.name();
        self.inner.append_str(&n, v);
        self
    }

    pub fn push_bool(&mut self, v: bool) -> &mut Self {
        let n = self.name();
        self.inner.append_bool(&n, v);
        self
    }

    pub fn push_null(&mut self) -> &mut Self {
        let n = self.name();
        self.inner.append_null(&n);
        self
    }

    pub fn push_date_ms(&mut self, millis: i64) -> &mut Self {
        let n = self.name();
        self.inner.append_date_ms(&n, millis);
        self
    }

    pub fn push_object(&mut self, doc: &[u8]) -> &mut Self {
        let n = self.name();
        self.inner.append_object(&n, doc);
        self
    }

    pub fn push_array(&mut self, doc: &[u8]) -> &mut Self {
        let n = self.name();
        self.inner.append_array(&n, doc);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.inner.finish()
    }
}

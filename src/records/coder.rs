//! # Schema-Directed Record Codec
//!
//! `RecordCoder` converts whole documents to and from the schema-directed
//! encoding. On encode it walks the declared columns in schema order,
//! writing each matched field at the column's storage width, then appends
//! the schema-less tail: every unmatched field in original document order,
//! self-described via the container sub-codec. The encoded record carries no
//! terminator of its own.
//!
//! Decode reverses the walk, streaming a reconstructed document into a
//! growable buffer whose 4-byte header is patched last. The result is a
//! valid standalone document.
//!
//! The coder owns two scratch structures (the field map and the stored-bit
//! set) that are cleared at the start of each encode to amortise
//! allocation. A coder is single-threaded; use one per worker.

use crate::doc::{DocElem, DocView, ElemType, OID_SIZE};
use crate::encoding::{ByteBuffer, Reader};
use crate::error::CodecError;
use crate::records::convert::{
    self, read_stored, stored_to_bool, stored_to_f64, stored_to_i32, stored_to_i64,
};
use crate::records::schema::{ColumnDef, ColumnType, Schema};
use crate::records::subdoc;
use eyre::{bail, ensure, Result};
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct RecordCoder {
    fields: HashMap<String, usize>,
    stored: Vec<bool>,
}

impl RecordCoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `doc` against `schema` into `out` (cleared first).
    ///
    /// Every declared column must be present in the document. Fields not
    /// covered by a declared column go to the schema-less tail when the
    /// schema ends with `"$$"`; otherwise extra fields are an error. Fields
    /// named by a column of `exclude` are skipped in the tail (they are
    /// stored by a sibling index and need not be duplicated).
    pub fn encode(
        &mut self,
        schema: &Schema,
        exclude: Option<&Schema>,
        doc: &DocView<'_>,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        out.clear();
        let elems: SmallVec<[DocElem<'_>; 16]> = doc.iter().collect::<Result<_>>()?;
        self.parse_fields(&elems)?;
        self.stored.clear();
        self.stored.resize(elems.len(), false);

        let ncols = schema.column_count();
        trace!(columns = ncols, fields = elems.len(), "encoding record");
        for i in 0..schema.declared_count() {
            let col = schema.column(i);
            let Some(&j) = self.fields.get(col.name.as_str()) else {
                debug!(column = %col.name, "declared column missing from document");
                bail!(CodecError::SchemaMismatch(format!(
                    "declared column missing from document: {}",
                    col.name
                )));
            };
            let is_last_field = i == ncols - 1;
            encode_column(col, &elems[j], is_last_field, out)?;
            self.stored[j] = true;
        }

        if !schema.has_schema_less_tail() {
            ensure!(
                self.stored.iter().all(|&s| s),
                CodecError::InvalidArgument(
                    "schema covers all fields, but document has extra fields".into()
                )
            );
            return Ok(());
        }

        for (idx, elem) in elems.iter().enumerate() {
            if self.stored[idx] {
                continue;
            }
            if let Some(ex) = exclude {
                if ex.find(elem.name()).is_some() {
                    continue;
                }
            }
            out.push(elem.elem_type().as_u8());
            out.extend_from_slice(elem.name().as_bytes());
            out.push(0);
            subdoc::encode_elem_val(elem, out, 0)?;
        }
        Ok(())
    }

    pub fn encode_to_vec(
        &mut self,
        schema: &Schema,
        exclude: Option<&Schema>,
        doc: &DocView<'_>,
    ) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(schema, exclude, doc, &mut out)?;
        Ok(out)
    }

    /// Decodes a schema-directed record back into a standalone document
    /// buffer.
    pub fn decode(schema: &Schema, data: &[u8]) -> Result<Vec<u8>> {
        let mut bb = ByteBuffer::with_capacity(4 + 2 * data.len());
        let mut r = Reader::new(data);
        let header = bb.reserve_u32();

        let ncols = schema.column_count();
        trace!(columns = ncols, bytes = data.len(), "decoding record");
        for i in 0..schema.declared_count() {
            let col = schema.column(i);
            bb.write_u8(col.meta.u_type.as_u8());
            bb.write_cstr(col.name.as_bytes());
            decode_column(col, i == ncols - 1, &mut bb, &mut r)?;
        }

        while !r.is_empty() {
            let tag = r.read_u8()?;
            ensure!(
                tag != 0,
                CodecError::InvalidEncoding("end-of-object in schema-less tail".into())
            );
            let etype = ElemType::from_u8(tag)?;
            bb.write_u8(tag);
            let name = r.read_cstr()?;
            bb.write_cstr(name);
            subdoc::decode_elem_val(&mut bb, &mut r, etype, 0)?;
        }

        bb.write_u8(ElemType::Eoo.as_u8());
        bb.patch_i32_le(header, bb.tell() as i32);
        Ok(bb.into_vec())
    }

    fn parse_fields(&mut self, elems: &[DocElem<'_>]) -> Result<()> {
        self.fields.clear();
        for (idx, elem) in elems.iter().enumerate() {
            if self.fields.insert(elem.name().to_string(), idx).is_some() {
                bail!(CodecError::InvalidArgument(format!(
                    "duplicate field name: {}",
                    elem.name()
                )));
            }
        }
        Ok(())
    }
}

fn encode_column(
    col: &ColumnDef,
    elem: &DocElem<'_>,
    is_last_field: bool,
    out: &mut Vec<u8>,
) -> Result<()> {
    let meta = &col.meta;
    match elem.elem_type() {
        ElemType::Eoo
        | ElemType::Undefined
        | ElemType::Null
        | ElemType::MaxKey
        | ElemType::MinKey => {}
        ElemType::Bool => {
            ensure!(
                meta.col_type == ColumnType::Uint08,
                CodecError::SchemaMismatch(format!(
                    "bool column {} must be Uint08, is {:?}",
                    col.name, meta.col_type
                ))
            );
            out.push(elem.as_bool()? as u8);
        }
        ElemType::Int32 => {
            convert::encode_int(meta.col_type, elem.as_i32()? as i64, out, is_last_field)?
        }
        ElemType::Int64 => convert::encode_int(meta.col_type, elem.as_i64()?, out, is_last_field)?,
        ElemType::Double => {
            convert::encode_double(meta.col_type, elem.as_f64()?, out, is_last_field)?
        }
        ElemType::Date => match meta.col_type {
            // 32-bit date columns store whole seconds
            ColumnType::Sint32 | ColumnType::Uint32 => {
                let seconds = elem.as_i64()? / 1000;
                out.extend_from_slice(&(seconds as i32).to_le_bytes());
            }
            ColumnType::Sint64 | ColumnType::Uint64 => out.extend_from_slice(elem.value()),
            other => bail!(CodecError::SchemaMismatch(format!(
                "date column {} must be a 32- or 64-bit integer, is {:?}",
                col.name, other
            ))),
        },
        ElemType::Timestamp => {
            ensure!(
                matches!(meta.col_type, ColumnType::Sint64 | ColumnType::Uint64),
                CodecError::SchemaMismatch(format!(
                    "timestamp column {} must be a 64-bit integer, is {:?}",
                    col.name, meta.col_type
                ))
            );
            out.extend_from_slice(elem.value());
        }
        ElemType::ObjectId => {
            ensure!(
                meta.col_type == ColumnType::Fixed && meta.fixed_len == OID_SIZE,
                CodecError::SchemaMismatch(format!(
                    "object-id column {} must be Fixed with length {}",
                    col.name, OID_SIZE
                ))
            );
            out.extend_from_slice(elem.value());
        }
        ElemType::String | ElemType::Symbol | ElemType::Code => {
            if meta.col_type == ColumnType::StrZero {
                out.extend_from_slice(elem.str_data()?);
            } else {
                convert::encode_str(meta.col_type, elem.str_text()?, out)?;
            }
        }
        ElemType::DbRef => {
            let (ns, oid) = elem.dbref_parts()?;
            out.extend_from_slice(ns);
            out.extend_from_slice(oid);
        }
        ElemType::Array => {
            ensure_car_bin(col, "array")?;
            let start = begin_car_bin(out);
            subdoc::encode_array(&elem.embedded_doc()?, out, 0)?;
            end_car_bin(out, start);
        }
        ElemType::Object => {
            ensure_car_bin(col, "object")?;
            let start = begin_car_bin(out);
            subdoc::encode_object(&elem.embedded_doc()?, out, 0)?;
            end_car_bin(out, start);
        }
        ElemType::CodeWScope => {
            ensure_car_bin(col, "code-with-scope")?;
            let (code_len, code, scope) = elem.code_w_scope()?;
            let start = begin_car_bin(out);
            out.extend_from_slice(&code_len.to_le_bytes());
            out.extend_from_slice(code);
            subdoc::encode_object(&scope, out, 0)?;
            end_car_bin(out, start);
        }
        ElemType::BinData => {
            ensure_car_bin(col, "binary")?;
            let (subtype, payload) = elem.bin_data()?;
            out.extend_from_slice(&((payload.len() + 1) as u32).to_le_bytes());
            out.push(subtype);
            out.extend_from_slice(payload);
        }
        ElemType::RegEx => {
            ensure!(
                meta.col_type == ColumnType::TwoStrZero,
                CodecError::SchemaMismatch(format!(
                    "regex column {} must be TwoStrZero, is {:?}",
                    col.name, meta.col_type
                ))
            );
            let (pattern, options) = elem.regex_parts()?;
            out.extend_from_slice(pattern);
            out.push(0);
            out.extend_from_slice(options);
            out.push(0);
        }
    }
    Ok(())
}

fn decode_column(
    col: &ColumnDef,
    is_last_field: bool,
    bb: &mut ByteBuffer,
    r: &mut Reader<'_>,
) -> Result<()> {
    let meta = &col.meta;
    match meta.u_type {
        ElemType::Eoo => bail!(CodecError::SchemaMismatch(format!(
            "column {} cannot materialise as end-of-object",
            col.name
        ))),
        ElemType::Undefined | ElemType::Null | ElemType::MaxKey | ElemType::MinKey => {}
        ElemType::Bool => {
            let truthy = stored_to_bool(read_stored(meta.col_type, r)?);
            bb.write_u8(truthy as u8);
        }
        ElemType::Int32 => bb.write_i32_le(stored_to_i32(read_stored(meta.col_type, r)?)),
        ElemType::Int64 => bb.write_i64_le(stored_to_i64(read_stored(meta.col_type, r)?)),
        ElemType::Double => bb.write_f64_le(stored_to_f64(read_stored(meta.col_type, r)?)),
        ElemType::Timestamp => {
            ensure!(
                matches!(meta.col_type, ColumnType::Sint64 | ColumnType::Uint64),
                CodecError::SchemaMismatch(format!(
                    "timestamp column {} must be a 64-bit integer, is {:?}",
                    col.name, meta.col_type
                ))
            );
            bb.write_bytes(r.take(8)?);
        }
        ElemType::Date => match meta.col_type {
            ColumnType::Sint32 | ColumnType::Uint32 => {
                let seconds = r.read_i32_le()? as i64;
                bb.write_i64_le(seconds * 1000);
            }
            ColumnType::Sint64 | ColumnType::Uint64 => bb.write_bytes(r.take(8)?),
            other => bail!(CodecError::SchemaMismatch(format!(
                "date column {} must be a 32- or 64-bit integer, is {:?}",
                col.name, other
            ))),
        },
        ElemType::ObjectId => {
            ensure!(
                meta.col_type == ColumnType::Fixed && meta.fixed_len == OID_SIZE,
                CodecError::SchemaMismatch(format!(
                    "object-id column {} must be Fixed with length {}",
                    col.name, OID_SIZE
                ))
            );
            bb.write_bytes(r.take(OID_SIZE)?);
        }
        ElemType::String | ElemType::Symbol | ElemType::Code => {
            ensure!(
                meta.col_type == ColumnType::StrZero,
                CodecError::SchemaMismatch(format!(
                    "string column {} must be StrZero, is {:?}",
                    col.name, meta.col_type
                ))
            );
            decode_str_zero(is_last_field, bb, r)?;
        }
        ElemType::DbRef => {
            let ns = r.read_cstr()?;
            bb.write_i32_le((ns.len() + 1) as i32);
            bb.write_cstr(ns);
            bb.write_bytes(r.take(OID_SIZE)?);
        }
        ElemType::Array => {
            ensure_car_bin(col, "array")?;
            let len = r.read_u32_le()? as usize;
            let mut window = Reader::new(r.take(len)?);
            subdoc::decode_array(bb, &mut window, 0)?;
        }
        ElemType::Object => {
            ensure_car_bin(col, "object")?;
            let len = r.read_u32_le()? as usize;
            let mut window = Reader::new(r.take(len)?);
            subdoc::decode_object(bb, &mut window, 0)?;
        }
        ElemType::CodeWScope => {
            ensure_car_bin(col, "code-with-scope")?;
            let len = r.read_u32_le()? as usize;
            let mut window = Reader::new(r.take(len)?);
            let total_slot = bb.reserve_u32();
            let code_len = window.read_u32_le()?;
            bb.write_u32_le(code_len);
            bb.write_bytes(window.take(code_len as usize)?);
            subdoc::decode_object(bb, &mut window, 0)?;
            bb.patch_u32_le(total_slot, (bb.tell() - total_slot) as u32);
        }
        ElemType::BinData => {
            ensure_car_bin(col, "binary")?;
            let len = r.read_u32_le()? as usize;
            ensure!(
                len >= 1,
                CodecError::InvalidEncoding("binary column payload missing subtype".into())
            );
            let payload = r.take(len)?;
            // the stored length counts the subtype byte, the document's
            // length prefix does not
            bb.write_i32_le((len - 1) as i32);
            bb.write_bytes(payload);
        }
        ElemType::RegEx => {
            ensure!(
                meta.col_type == ColumnType::TwoStrZero,
                CodecError::SchemaMismatch(format!(
                    "regex column {} must be TwoStrZero, is {:?}",
                    col.name, meta.col_type
                ))
            );
            decode_two_str_zero(is_last_field, bb, r)?;
        }
    }
    Ok(())
}

/// Re-frames a stored NUL-terminated string as a length-prefixed document
/// string. The last declared column may have elided its terminator, in
/// which case the remaining buffer is the string and a NUL is synthesised.
pub(crate) fn decode_str_zero(
    is_last_field: bool,
    bb: &mut ByteBuffer,
    r: &mut Reader<'_>,
) -> Result<()> {
    if is_last_field {
        let rest = r.take_rest();
        if rest.is_empty() {
            bb.write_i32_le(1);
            bb.write_u8(0);
        } else if rest[rest.len() - 1] != 0 {
            bb.write_i32_le((rest.len() + 1) as i32);
            bb.write_cstr(rest);
        } else {
            bb.write_i32_le(rest.len() as i32);
            bb.write_bytes(rest);
        }
    } else {
        let s = r.read_cstr()?;
        bb.write_i32_le((s.len() + 1) as i32);
        bb.write_cstr(s);
    }
    Ok(())
}

/// Two consecutive NUL-terminated strings; the last column may have elided
/// the final terminator.
pub(crate) fn decode_two_str_zero(
    is_last_field: bool,
    bb: &mut ByteBuffer,
    r: &mut Reader<'_>,
) -> Result<()> {
    let rest = r.peek_rest();
    if is_last_field && (rest.is_empty() || rest[rest.len() - 1] != 0) {
        if rest.is_empty() {
            bb.write_u8(0);
            bb.write_u8(0);
            return Ok(());
        }
        let pattern = r.read_cstr()?;
        bb.write_cstr(pattern);
        bb.write_cstr(r.take_rest());
    } else {
        let pattern = r.read_cstr()?;
        let options = r.read_cstr()?;
        bb.write_cstr(pattern);
        bb.write_cstr(options);
    }
    Ok(())
}

fn ensure_car_bin(col: &ColumnDef, what: &str) -> Result<()> {
    ensure!(
        col.meta.col_type == ColumnType::CarBin,
        CodecError::SchemaMismatch(format!(
            "{} column {} must be CarBin, is {:?}",
            what, col.name, col.meta.col_type
        ))
    );
    Ok(())
}

/// Reserves the 4-byte container length slot, returning the payload start.
fn begin_car_bin(out: &mut Vec<u8>) -> usize {
    out.extend_from_slice(&[0u8; 4]);
    out.len()
}

fn end_car_bin(out: &mut Vec<u8>, start: usize) {
    let len = (out.len() - start) as u32;
    out[start - 4..start].copy_from_slice(&len.to_le_bytes());
}

/// Relaxed structural equality of two documents' top-level fields: the same
/// name set, and byte-equal elements. When either side is a Double the
/// values compare numerically with 10% relative tolerance instead, since
/// schema round-trips may narrow floats. A zero left-hand value equals
/// only a zero right-hand value.
pub fn fields_equal(x: &DocView<'_>, y: &DocView<'_>) -> Result<bool> {
    let xs: SmallVec<[DocElem<'_>; 16]> = x.iter().collect::<Result<_>>()?;
    let ys: SmallVec<[DocElem<'_>; 16]> = y.iter().collect::<Result<_>>()?;
    if xs.len() != ys.len() {
        return Ok(false);
    }

    let mut by_name: HashMap<&str, &DocElem<'_>> = HashMap::with_capacity(ys.len());
    for elem in &ys {
        if by_name.insert(elem.name(), elem).is_some() {
            bail!(CodecError::InvalidArgument(format!(
                "duplicate field name: {}",
                elem.name()
            )));
        }
    }

    for xe in &xs {
        let Some(ye) = by_name.get(xe.name()) else {
            return Ok(false);
        };
        if xe.elem_type() == ElemType::Double || ye.elem_type() == ElemType::Double {
            let xd = xe.numeric_as_f64()?;
            let yd = ye.numeric_as_f64()?;
            if xd == 0.0 {
                if yd != 0.0 {
                    return Ok(false);
                }
                continue;
            }
            if ((xd - yd) / xd).abs() > 0.1 {
                return Ok(false);
            }
        } else if xe.elem_type() != ye.elem_type() || xe.value() != ye.value() {
            return Ok(false);
        }
    }
    Ok(true)
}

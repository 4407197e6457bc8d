//! # Order-Preserving Index Keys
//!
//! A restricted encoder/decoder over an ordered column prefix, used by the
//! storage engine's ordered index structures. Differences from the record
//! codec:
//!
//! - Fields are consumed positionally, not matched by name; a document with
//!   fewer fields than columns yields a prefix key (the missing suffix
//!   emits nothing), which is how range bounds are built.
//! - Containers (arrays, objects, code-with-scope, binary) are not valid
//!   key fields; an index key holds only scalars, strings, ObjectId, and
//!   RegEx.
//! - An empty object in the first position is the sentinel empty key.
//! - Date and Timestamp go through the numeric conversion matrix at the
//!   column's width; there is no seconds compression.
//! - There is no schema-less tail, and decode must consume the whole key.

use crate::doc::{DocView, ElemType, OID_SIZE};
use crate::encoding::{ByteBuffer, Reader};
use crate::error::CodecError;
use crate::records::coder::{decode_str_zero, decode_two_str_zero};
use crate::records::convert::{
    self, read_stored, stored_to_bool, stored_to_f64, stored_to_i32, stored_to_i64,
};
use crate::records::schema::{ColumnType, Schema};
use eyre::{bail, ensure, Result};
use tracing::trace;

/// Encodes `doc`'s fields positionally against `schema` into `out`
/// (cleared first).
pub fn encode_index_key(schema: &Schema, doc: &DocView<'_>, out: &mut Vec<u8>) -> Result<()> {
    out.clear();
    let ncols = schema.column_count();
    trace!(columns = ncols, "encoding index key");
    let mut iter = doc.iter();
    for i in 0..ncols {
        let col = schema.column(i);
        let meta = &col.meta;
        let is_last_field = i == ncols - 1;
        let Some(elem) = iter.next() else {
            // shorter document: a prefix key for range bounds
            continue;
        };
        let elem = elem?;
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
                        "bool key column {} must be Uint08, is {:?}",
                        col.name, meta.col_type
                    ))
                );
                out.push(elem.as_bool()? as u8);
            }
            ElemType::Int32 => {
                convert::encode_int(meta.col_type, elem.as_i32()? as i64, out, is_last_field)?
            }
            ElemType::Int64 | ElemType::Date | ElemType::Timestamp => {
                convert::encode_int(meta.col_type, elem.as_i64()?, out, is_last_field)?
            }
            ElemType::Double => {
                convert::encode_double(meta.col_type, elem.as_f64()?, out, is_last_field)?
            }
            ElemType::ObjectId => {
                ensure!(
                    meta.col_type == ColumnType::Fixed && meta.fixed_len == OID_SIZE,
                    CodecError::SchemaMismatch(format!(
                        "object-id key column {} must be Fixed with length {}",
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
            ElemType::Object => {
                if i == 0 && elem.embedded_doc()?.is_empty() {
                    // sentinel empty key, used for min bounds
                    out.clear();
                    return Ok(());
                }
                bail!(CodecError::UnsupportedConversion(
                    "object cannot be an index key field".into()
                ));
            }
            ElemType::Array => bail!(CodecError::UnsupportedConversion(
                "array cannot be an index key field".into()
            )),
            ElemType::CodeWScope => bail!(CodecError::UnsupportedConversion(
                "code-with-scope cannot be an index key field".into()
            )),
            ElemType::BinData => bail!(CodecError::UnsupportedConversion(
                "binary cannot be an index key field".into()
            )),
            ElemType::DbRef => bail!(CodecError::UnsupportedConversion(
                "dbref cannot be an index key field".into()
            )),
            ElemType::RegEx => {
                ensure!(
                    meta.col_type == ColumnType::TwoStrZero,
                    CodecError::SchemaMismatch(format!(
                        "regex key column {} must be TwoStrZero, is {:?}",
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
    }
    Ok(())
}

/// Decodes an index key back into a standalone document buffer.
pub fn decode_index_key(schema: &Schema, data: &[u8]) -> Result<Vec<u8>> {
    let mut bb = ByteBuffer::with_capacity(4 + 2 * data.len());
    let mut r = Reader::new(data);
    let header = bb.reserve_u32();

    let ncols = schema.column_count();
    trace!(columns = ncols, bytes = data.len(), "decoding index key");
    for i in 0..ncols {
        let col = schema.column(i);
        let meta = &col.meta;
        bb.write_u8(meta.u_type.as_u8());
        bb.write_cstr(col.name.as_bytes());
        match meta.u_type {
            ElemType::Eoo => bail!(CodecError::SchemaMismatch(format!(
                "column {} cannot materialise as end-of-object",
                col.name
            ))),
            ElemType::Undefined | ElemType::Null | ElemType::MaxKey | ElemType::MinKey => {}
            ElemType::Bool => {
                let truthy = stored_to_bool(read_stored(meta.col_type, &mut r)?);
                bb.write_u8(truthy as u8);
            }
            ElemType::Int32 => bb.write_i32_le(stored_to_i32(read_stored(meta.col_type, &mut r)?)),
            ElemType::Int64 | ElemType::Date | ElemType::Timestamp => {
                bb.write_i64_le(stored_to_i64(read_stored(meta.col_type, &mut r)?))
            }
            ElemType::Double => {
                bb.write_f64_le(stored_to_f64(read_stored(meta.col_type, &mut r)?))
            }
            ElemType::ObjectId => {
                ensure!(
                    meta.col_type == ColumnType::Fixed && meta.fixed_len == OID_SIZE,
                    CodecError::SchemaMismatch(format!(
                        "object-id key column {} must be Fixed with length {}",
                        col.name, OID_SIZE
                    ))
                );
                bb.write_bytes(r.take(OID_SIZE)?);
            }
            ElemType::String | ElemType::Symbol | ElemType::Code => {
                ensure!(
                    meta.col_type == ColumnType::StrZero,
                    CodecError::SchemaMismatch(format!(
                        "string key column {} must be StrZero, is {:?}",
                        col.name, meta.col_type
                    ))
                );
                decode_str_zero(i == ncols - 1, &mut bb, &mut r)?;
            }
            ElemType::Array | ElemType::Object | ElemType::CodeWScope | ElemType::BinData => {
                bail!(CodecError::UnsupportedConversion(format!(
                    "{:?} cannot be an index key field",
                    meta.u_type
                )))
            }
            ElemType::DbRef => bail!(CodecError::UnsupportedConversion(
                "dbref cannot be an index key field".into()
            )),
            ElemType::RegEx => {
                ensure!(
                    meta.col_type == ColumnType::TwoStrZero,
                    CodecError::SchemaMismatch(format!(
                        "regex key column {} must be TwoStrZero, is {:?}",
                        col.name, meta.col_type
                    ))
                );
                decode_two_str_zero(i == ncols - 1, &mut bb, &mut r)?;
            }
        }
    }
    ensure!(
        r.is_empty(),
        CodecError::InvalidEncoding(format!(
            "{} trailing bytes after last index key column",
            r.remaining()
        ))
    );

    bb.write_u8(ElemType::Eoo.as_u8());
    bb.patch_i32_le(header, bb.tell() as i32);
    Ok(bb.into_vec())
}

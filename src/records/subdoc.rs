//! # Schema-Agnostic Container Sub-Codec
//!
//! Nested objects and arrays are stored self-describing, independent of any
//! schema. Objects keep `tag | name | value` per field plus the terminator;
//! arrays are type-compressed:
//!
//! ```text
//! var_uint(count) | item_tag | value value value ...
//! ```
//!
//! Array indices are never stored; the decoder resynthesises "0", "1", ….
//! When the items do not share one tag, `item_tag` is the heterogeneous
//! sentinel `0x81` and each value is preceded by its own tag byte.
//!
//! Strings lose their 4-byte length prefix on encode (the NUL suffices) and
//! get it recomputed on decode. Each decoded object or array reserves a
//! 4-byte length slot that is patched once the frame is complete.
//!
//! Recursion in either direction is bounded by [`MAX_NESTING_DEPTH`].

use crate::doc::{DocElem, DocView, ElemType, OID_SIZE};
use crate::encoding::{encode_varint, ByteBuffer, Reader, MAX_VARINT_LEN};
use crate::error::CodecError;
use eyre::{bail, ensure, Result};

/// Tag marking an array whose items do not share one element type.
pub const HETEROGENEOUS_TAG: u8 = 0x81;

/// Initial value of the array type scan; never serialised.
const SCAN_SEED: u8 = 0x80;

/// Containers nested deeper than this fail with `InvalidEncoding`.
pub const MAX_NESTING_DEPTH: usize = 100;

fn check_depth(depth: usize) -> Result<()> {
    ensure!(
        depth <= MAX_NESTING_DEPTH,
        CodecError::InvalidEncoding(format!(
            "container nesting exceeds {} levels",
            MAX_NESTING_DEPTH
        ))
    );
    Ok(())
}

/// Emits the value bytes of one element, schema-agnostically.
pub(crate) fn encode_elem_val(elem: &DocElem<'_>, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    match elem.elem_type() {
        ElemType::Eoo
        | ElemType::Undefined
        | ElemType::Null
        | ElemType::MaxKey
        | ElemType::MinKey => {}
        ElemType::Bool => out.push(elem.as_bool()? as u8),
        ElemType::Int32
        | ElemType::Double
        | ElemType::Date
        | ElemType::Timestamp
        | ElemType::Int64
        | ElemType::ObjectId => out.extend_from_slice(elem.value()),
        ElemType::String | ElemType::Symbol | ElemType::Code => {
            // drop the length prefix, keep the NUL
            out.extend_from_slice(elem.str_data()?);
        }
        ElemType::DbRef => {
            let (ns, oid) = elem.dbref_parts()?;
            out.extend_from_slice(ns);
            out.extend_from_slice(oid);
        }
        ElemType::Array => encode_array(&elem.embedded_doc()?, out, depth + 1)?,
        ElemType::Object => encode_object(&elem.embedded_doc()?, out, depth + 1)?,
        // length prefix retained: the whole frame is copied verbatim
        ElemType::CodeWScope => out.extend_from_slice(elem.value()),
        ElemType::BinData => out.extend_from_slice(elem.value()),
        ElemType::RegEx => {
            let (pattern, options) = elem.regex_parts()?;
            out.extend_from_slice(pattern);
            out.push(0);
            out.extend_from_slice(options);
            out.push(0);
        }
    }
    Ok(())
}

pub(crate) fn encode_object(doc: &DocView<'_>, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    check_depth(depth)?;
    for elem in doc.iter() {
        let elem = elem?;
        out.push(elem.elem_type().as_u8());
        out.extend_from_slice(elem.name().as_bytes());
        out.push(0);
        encode_elem_val(&elem, out, depth)?;
    }
    out.push(ElemType::Eoo.as_u8());
    Ok(())
}

pub(crate) fn encode_array(arr: &DocView<'_>, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    check_depth(depth)?;

    let mut count: u32 = 0;
    let mut item_type = SCAN_SEED;
    for item in arr.iter() {
        let tag = item?.elem_type().as_u8();
        if item_type == SCAN_SEED {
            item_type = tag;
        } else if item_type != tag {
            item_type = HETEROGENEOUS_TAG;
        }
        count += 1;
    }

    let mut tmp = [0u8; MAX_VARINT_LEN];
    let n = encode_varint(count, &mut tmp);
    out.extend_from_slice(&tmp[..n]);
    if count == 0 {
        return Ok(());
    }

    out.push(item_type);
    for item in arr.iter() {
        let item = item?;
        if item_type == HETEROGENEOUS_TAG {
            out.push(item.elem_type().as_u8());
        }
        encode_elem_val(&item, out, depth)?;
    }
    Ok(())
}

/// Decodes the value bytes of one element of type `etype`, emitting the
/// self-describing form with length prefixes recomputed.
pub(crate) fn decode_elem_val(
    bb: &mut ByteBuffer,
    r: &mut Reader<'_>,
    etype: ElemType,
    depth: usize,
) -> Result<()> {
    match etype {
        ElemType::Eoo => bail!(CodecError::InvalidEncoding(
            "unexpected end-of-object tag".into()
        )),
        ElemType::Undefined | ElemType::Null | ElemType::MaxKey | ElemType::MinKey => {}
        ElemType::Bool => {
            let b = r.read_u8()?;
            bb.write_u8((b != 0) as u8);
        }
        ElemType::Int32 => bb.write_bytes(r.take(4)?),
        ElemType::Double | ElemType::Date | ElemType::Timestamp | ElemType::Int64 => {
            bb.write_bytes(r.take(8)?)
        }
        ElemType::ObjectId => bb.write_bytes(r.take(OID_SIZE)?),
        ElemType::String | ElemType::Symbol | ElemType::Code => {
            let s = r.read_cstr()?;
            bb.write_i32_le((s.len() + 1) as i32);
            bb.write_cstr(s);
        }
        ElemType::DbRef => {
            let ns = r.read_cstr()?;
            bb.write_i32_le((ns.len() + 1) as i32);
            bb.write_cstr(ns);
            bb.write_bytes(r.take(OID_SIZE)?);
        }
        ElemType::Array => decode_array(bb, r, depth + 1)?,
        ElemType::Object => decode_object(bb, r, depth + 1)?,
        ElemType::CodeWScope => {
            let total = r.read_i32_le()?;
            ensure!(
                total >= 4,
                CodecError::InvalidEncoding(format!("bad code-with-scope length: {}", total))
            );
            bb.write_i32_le(total);
            bb.write_bytes(r.take(total as usize - 4)?);
        }
        ElemType::BinData => {
            let len = r.read_i32_le()?;
            ensure!(
                len >= 0,
                CodecError::InvalidEncoding(format!("bad binary length: {}", len))
            );
            let subtype = r.read_u8()?;
            bb.write_i32_le(len);
            bb.write_u8(subtype);
            bb.write_bytes(r.take(len as usize)?);
        }
        ElemType::RegEx => {
            let pattern = r.read_cstr()?;
            let options = r.read_cstr()?;
            bb.write_cstr(pattern);
            bb.write_cstr(options);
        }
    }
    Ok(())
}

pub(crate) fn decode_object(bb: &mut ByteBuffer, r: &mut Reader<'_>, depth: usize) -> Result<()> {
    check_depth(depth)?;
    let len_slot = bb.reserve_u32();
    loop {
        let tag = r.read_u8()?;
        bb.write_u8(tag);
        if tag == ElemType::Eoo.as_u8() {
            break;
        }
        let etype = ElemType::from_u8(tag)?;
        let name = r.read_cstr()?;
        bb.write_cstr(name);
        decode_elem_val(bb, r, etype, depth)?;
    }
    bb.patch_i32_le(len_slot, (bb.tell() - len_slot) as i32);
    Ok(())
}

pub(crate) fn decode_array(bb: &mut ByteBuffer, r: &mut Reader<'_>, depth: usize) -> Result<()> {
    check_depth(depth)?;
    let count = r.read_var_u32()?;
    if count == 0 {
        // five bytes: the empty document
        bb.write_i32_le(5);
        bb.write_u8(ElemType::Eoo.as_u8());
        return Ok(());
    }
    let item_type = r.read_u8()?;
    let len_slot = bb.reserve_u32();
    let mut idx_buf = [0u8; 10];
    for idx in 0..count {
        let cur = if item_type == HETEROGENEOUS_TAG {
            r.read_u8()?
        } else {
            item_type
        };
        let etype = ElemType::from_u8(cur)?;
        bb.write_u8(cur);
        bb.write_cstr(write_decimal(&mut idx_buf, idx));
        decode_elem_val(bb, r, etype, depth)?;
    }
    bb.write_u8(ElemType::Eoo.as_u8());
    bb.patch_i32_le(len_slot, (bb.tell() - len_slot) as i32);
    Ok(())
}

/// Formats `v` as canonical decimal ("0", "1", …, no leading zeros) into
/// `buf` and returns the written prefix.
fn write_decimal(buf: &mut [u8; 10], v: u32) -> &[u8] {
    let mut i = buf.len();
    let mut v = v;
    loop {
        i -= 1;
        buf[i] = b'0' + (v % 10) as u8;
        v /= 10;
        if v == 0 {
            break;
        }
    }
    buf.copy_within(i.., 0);
    let len = 10 - i;
    &buf[..len]
}

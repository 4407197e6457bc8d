//! # End-to-End Codec Scenarios
//!
//! Exercises the public surface the way the storage engine drives it:
//! build a document, encode it against a schema, decode the bytes back,
//! and compare byte-for-byte. Covers the scenario matrix:
//!
//! 1. Declared scalars + schema-less tail
//! 2. Fixed-width columns (ObjectId, Timestamp)
//! 3. Container columns (arrays, objects, code-with-scope, binary)
//! 4. Date width compression (32-bit seconds vs 64-bit milliseconds)
//! 5. Clamping and text conversions
//! 6. Index keys, including prefix and sentinel keys

use docpack::{
    decode_index_key, encode_index_key, fields_equal, ArrayBuilder, CodecError, ColumnDef,
    ColumnMeta, ColumnType, DocBuilder, DocView, ElemType, RecordCoder, Schema, HETEROGENEOUS_TAG,
    SCHEMA_LESS_FIELD,
};

fn col(name: &str, col_type: ColumnType, u_type: ElemType) -> ColumnDef {
    ColumnDef::new(name, ColumnMeta::new(col_type, u_type))
}

fn tail_col() -> ColumnDef {
    col(SCHEMA_LESS_FIELD, ColumnType::CarBin, ElemType::Object)
}

fn roundtrip(schema: &Schema, doc: &[u8]) -> Vec<u8> {
    let mut coder = RecordCoder::new();
    let record = coder
        .encode_to_vec(schema, None, &DocView::new(doc).unwrap())
        .unwrap();
    RecordCoder::decode(schema, &record).unwrap()
}

#[test]
fn scalar_string_and_tail_exact_bytes() {
    let schema = Schema::new(vec![
        col("a", ColumnType::Sint32, ElemType::Int32),
        col("b", ColumnType::StrZero, ElemType::String),
        tail_col(),
    ])
    .unwrap();

    let mut b = DocBuilder::new();
    b.append_i32("a", 42)
        .append_str("b", "hi")
        .append_bool("c", true)
        .append_f64("d", 3.5);
    let doc = b.finish();

    let mut coder = RecordCoder::new();
    let record = coder
        .encode_to_vec(&schema, None, &DocView::new(&doc).unwrap())
        .unwrap();

    let mut expected = vec![0x2A, 0x00, 0x00, 0x00];
    expected.extend_from_slice(b"hi\0");
    expected.extend_from_slice(&[0x08, b'c', 0x00, 0x01]);
    expected.extend_from_slice(&[0x01, b'd', 0x00]);
    expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x40]);
    assert_eq!(record, expected);

    assert_eq!(RecordCoder::decode(&schema, &record).unwrap(), doc);
}

#[test]
fn fixed_width_columns_are_raw_copies() {
    let schema = Schema::new(vec![
        ColumnDef::new("oid", ColumnMeta::fixed(12, ElemType::ObjectId)),
        col("ts", ColumnType::Uint64, ElemType::Timestamp),
    ])
    .unwrap();

    let oid = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0x0A, 0x0B];
    let ts: u64 = (2u64 << 32) | 1;
    let mut b = DocBuilder::new();
    b.append_object_id("oid", &oid).append_timestamp("ts", ts);
    let doc = b.finish();

    let mut coder = RecordCoder::new();
    let record = coder
        .encode_to_vec(&schema, None, &DocView::new(&doc).unwrap())
        .unwrap();
    assert_eq!(&record[..12], &oid);
    assert_eq!(&record[12..], &ts.to_le_bytes());

    assert_eq!(RecordCoder::decode(&schema, &record).unwrap(), doc);
}

#[test]
fn heterogeneous_array_wire_format() {
    let schema = Schema::new(vec![col("xs", ColumnType::CarBin, ElemType::Array)]).unwrap();
    let arr = {
        let mut a = ArrayBuilder::new();
        a.push_i32(1).push_str("x").push_i32(2);
        a.finish()
    };
    let mut b = DocBuilder::new();
    b.append_array("xs", &arr);
    let doc = b.finish();

    let mut coder = RecordCoder::new();
    let record = coder
        .encode_to_vec(&schema, None, &DocView::new(&doc).unwrap())
        .unwrap();

    // payload: var_uint(3) | 0x81 | 0x10 i32 | 0x02 "x\0" | 0x10 i32
    let expected_payload = [
        3,
        HETEROGENEOUS_TAG,
        0x10,
        1,
        0,
        0,
        0,
        0x02,
        b'x',
        0,
        0x10,
        2,
        0,
        0,
        0,
    ];
    assert_eq!(&record[4..], &expected_payload);

    let restored = RecordCoder::decode(&schema, &record).unwrap();
    assert_eq!(restored, doc);

    let view = DocView::new(&restored).unwrap();
    let elem = view.iter().next().unwrap().unwrap();
    let names: Vec<String> = elem
        .embedded_doc()
        .unwrap()
        .iter()
        .map(|e| e.unwrap().name().to_string())
        .collect();
    assert_eq!(names, ["0", "1", "2"]);
}

#[test]
fn deeply_mixed_document_roundtrips() {
    let inner_arr = {
        let mut a = ArrayBuilder::new();
        a.push_f64(1.25).push_f64(-9.5);
        a.finish()
    };
    let inner_obj = {
        let mut b = DocBuilder::new();
        b.append_array("scores", &inner_arr)
            .append_str("tag", "nested");
        b.finish()
    };

    let schema = Schema::new(vec![
        col("id", ColumnType::Sint64, ElemType::Int64),
        col("meta", ColumnType::CarBin, ElemType::Object),
        tail_col(),
    ])
    .unwrap();

    let mut b = DocBuilder::new();
    b.append_i64("id", 99)
        .append_object("meta", &inner_obj)
        .append_bin_data("raw", 0x00, &[0xDE, 0xAD])
        .append_regex("pat", "n.*", "")
        .append_symbol("sym", "atom")
        .append_code("fn", "return 1;");
    let doc = b.finish();

    assert_eq!(roundtrip(&schema, &doc), doc);
}

#[test]
fn date_width_compression() {
    let schema32 = Schema::new(vec![col("d", ColumnType::Sint32, ElemType::Date)]).unwrap();
    let schema64 = Schema::new(vec![col("d", ColumnType::Uint64, ElemType::Date)]).unwrap();

    let mut b = DocBuilder::new();
    b.append_date_ms("d", 1_700_000_000_123);
    let doc = b.finish();

    let mut coder = RecordCoder::new();
    let record32 = coder
        .encode_to_vec(&schema32, None, &DocView::new(&doc).unwrap())
        .unwrap();
    assert_eq!(record32, 1_700_000_000i32.to_le_bytes());

    let restored = RecordCoder::decode(&schema32, &record32).unwrap();
    let elem = DocView::new(&restored)
        .unwrap()
        .iter()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(elem.as_i64().unwrap(), 1_700_000_000_000);

    // 64-bit columns keep the milliseconds and round-trip exactly
    let record64 = coder
        .encode_to_vec(&schema64, None, &DocView::new(&doc).unwrap())
        .unwrap();
    assert_eq!(record64, 1_700_000_000_123i64.to_le_bytes());
    assert_eq!(RecordCoder::decode(&schema64, &record64).unwrap(), doc);
}

#[test]
fn double_clamps_into_narrow_column() {
    let schema = Schema::new(vec![col("v", ColumnType::Sint08, ElemType::Double)]).unwrap();
    let mut coder = RecordCoder::new();
    for (input, stored) in [(500.0f64, 0x7Fu8), (-500.0, 0x80), (12.9, 12)] {
        let mut b = DocBuilder::new();
        b.append_f64("v", input);
        let doc = b.finish();
        let record = coder
            .encode_to_vec(&schema, None, &DocView::new(&doc).unwrap())
            .unwrap();
        assert_eq!(record, vec![stored], "clamp failed for {}", input);
    }
}

#[test]
fn lossy_float_roundtrip_stays_fields_equal() {
    let schema = Schema::new(vec![col("v", ColumnType::Float32, ElemType::Double)]).unwrap();
    let mut b = DocBuilder::new();
    b.append_f64("v", 1234.5678);
    let doc = b.finish();

    let restored = roundtrip(&schema, &doc);
    // float32 narrowing loses bits, so the buffers differ...
    assert_ne!(restored, doc);
    // ...but stay within the relaxed comparison's tolerance
    assert!(fields_equal(
        &DocView::new(&doc).unwrap(),
        &DocView::new(&restored).unwrap()
    )
    .unwrap());
}

#[test]
fn exclude_schema_filters_tail() {
    let schema = Schema::new(vec![
        col("a", ColumnType::Sint32, ElemType::Int32),
        tail_col(),
    ])
    .unwrap();
    let exclude =
        Schema::new(vec![col("covered", ColumnType::StrZero, ElemType::String)]).unwrap();

    let mut b = DocBuilder::new();
    b.append_i32("a", 1)
        .append_str("covered", "in the index")
        .append_i32("loose", 2);
    let doc = b.finish();

    let mut coder = RecordCoder::new();
    let record = coder
        .encode_to_vec(&schema, Some(&exclude), &DocView::new(&doc).unwrap())
        .unwrap();

    let restored = RecordCoder::decode(&schema, &record).unwrap();
    let names: Vec<String> = DocView::new(&restored)
        .unwrap()
        .iter()
        .map(|e| e.unwrap().name().to_string())
        .collect();
    assert_eq!(names, ["a", "loose"]);
}

#[test]
fn index_key_prefix_and_sentinel() {
    let schema = Schema::new(vec![
        col("a", ColumnType::Sint32, ElemType::Int32),
        col("b", ColumnType::StrZero, ElemType::String),
    ])
    .unwrap();

    // full key
    let mut b = DocBuilder::new();
    b.append_i32("a", 3).append_str("b", "k");
    let full = b.finish();
    let mut key = Vec::new();
    encode_index_key(&schema, &DocView::new(&full).unwrap(), &mut key).unwrap();
    assert_eq!(decode_index_key(&schema, &key).unwrap(), full);

    // prefix key: only the first column
    let mut b = DocBuilder::new();
    b.append_i32("a", 3);
    let prefix = b.finish();
    let mut key = Vec::new();
    encode_index_key(&schema, &DocView::new(&prefix).unwrap(), &mut key).unwrap();
    assert_eq!(key, 3i32.to_le_bytes());

    // sentinel: empty object in first position yields the empty key
    let empty = DocBuilder::new().finish();
    let mut b = DocBuilder::new();
    b.append_object("min", &empty);
    let sentinel = b.finish();
    let mut key = Vec::new();
    encode_index_key(&schema, &DocView::new(&sentinel).unwrap(), &mut key).unwrap();
    assert!(key.is_empty());
}

#[test]
fn error_kinds_are_downcastable() {
    let schema = Schema::new(vec![
        col("a", ColumnType::Sint32, ElemType::Int32),
        col("b", ColumnType::Sint32, ElemType::Int32),
    ])
    .unwrap();

    // SchemaMismatch: declared column missing
    let mut b = DocBuilder::new();
    b.append_i32("a", 1);
    let doc = b.finish();
    let mut coder = RecordCoder::new();
    let err = coder
        .encode_to_vec(&schema, None, &DocView::new(&doc).unwrap())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CodecError>(),
        Some(CodecError::SchemaMismatch(_))
    ));

    // InvalidEncoding: truncated record
    let err = RecordCoder::decode(&schema, &[1, 2]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CodecError>(),
        Some(CodecError::InvalidEncoding(_))
    ));

    // UnsupportedConversion: Float128 column
    let f128 = Schema::new(vec![col("v", ColumnType::Float128, ElemType::Double)]).unwrap();
    let mut b = DocBuilder::new();
    b.append_f64("v", 1.0);
    let doc = b.finish();
    let err = coder
        .encode_to_vec(&f128, None, &DocView::new(&doc).unwrap())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CodecError>(),
        Some(CodecError::UnsupportedConversion(_))
    ));

    // InvalidArgument: duplicate column in schema
    let err = Schema::new(vec![
        col("a", ColumnType::Sint32, ElemType::Int32),
        col("a", ColumnType::Sint32, ElemType::Int32),
    ])
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CodecError>(),
        Some(CodecError::InvalidArgument(_))
    ));
}

//! Record codec benchmarks
//!
//! Measures the hot paths the storage engine drives on every row: record
//! encode, record decode, and index-key encode.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use docpack::{
    encode_index_key, ArrayBuilder, ColumnDef, ColumnMeta, ColumnType, DocBuilder, DocView,
    ElemType, RecordCoder, Schema, SCHEMA_LESS_FIELD,
};

fn col(name: &str, col_type: ColumnType, u_type: ElemType) -> ColumnDef {
    ColumnDef::new(name, ColumnMeta::new(col_type, u_type))
}

fn sample_schema() -> Schema {
    Schema::new(vec![
        ColumnDef::new("oid", ColumnMeta::fixed(12, ElemType::ObjectId)),
        col("seq", ColumnType::Sint64, ElemType::Int64),
        col("score", ColumnType::Float64, ElemType::Double),
        col("name", ColumnType::StrZero, ElemType::String),
        col("tags", ColumnType::CarBin, ElemType::Array),
        ColumnDef::new(
            SCHEMA_LESS_FIELD,
            ColumnMeta::new(ColumnType::CarBin, ElemType::Object),
        ),
    ])
    .unwrap()
}

fn sample_doc() -> Vec<u8> {
    let tags = {
        let mut a = ArrayBuilder::new();
        a.push_str("alpha").push_str("beta").push_str("gamma");
        a.finish()
    };
    let mut b = DocBuilder::new();
    b.append_object_id("oid", &[7; 12])
        .append_i64("seq", 123_456_789)
        .append_f64("score", 0.875)
        .append_str("name", "a reasonably sized name field")
        .append_array("tags", &tags)
        .append_bool("active", true)
        .append_date_ms("seen", 1_700_000_000_000);
    b.finish()
}

fn bench_encode(c: &mut Criterion) {
    let schema = sample_schema();
    let doc = sample_doc();
    let view = DocView::new(&doc).unwrap();
    let mut coder = RecordCoder::new();
    let mut out = Vec::new();

    let mut group = c.benchmark_group("record_encode");
    group.throughput(Throughput::Bytes(doc.len() as u64));
    group.bench_function("mixed_document", |b| {
        b.iter(|| {
            coder
                .encode(&schema, None, black_box(&view), &mut out)
                .unwrap();
            black_box(out.len())
        })
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let schema = sample_schema();
    let doc = sample_doc();
    let mut coder = RecordCoder::new();
    let record = coder
        .encode_to_vec(&schema, None, &DocView::new(&doc).unwrap())
        .unwrap();

    let mut group = c.benchmark_group("record_decode");
    group.throughput(Throughput::Bytes(record.len() as u64));
    group.bench_function("mixed_document", |b| {
        b.iter(|| RecordCoder::decode(&schema, black_box(&record)).unwrap())
    });
    group.finish();
}

fn bench_index_key(c: &mut Criterion) {
    let schema = Schema::new(vec![
        col("seq", ColumnType::Sint64, ElemType::Int64),
        col("name", ColumnType::StrZero, ElemType::String),
    ])
    .unwrap();
    let mut b = DocBuilder::new();
    b.append_i64("seq", 42).append_str("name", "index key field");
    let doc = b.finish();
    let view = DocView::new(&doc).unwrap();
    let mut out = Vec::new();

    let mut group = c.benchmark_group("index_key_encode");
    group.throughput(Throughput::Bytes(doc.len() as u64));
    group.bench_function("two_columns", |b| {
        b.iter(|| {
            encode_index_key(&schema, black_box(&view), &mut out).unwrap();
            black_box(out.len())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_index_key);
criterion_main!(benches);

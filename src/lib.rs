//! # docpack - Schema-Directed Record Codec
//!
//! docpack converts documents in a self-describing binary format (a tagged,
//! length-prefixed key/value tree) into a compact schema-directed encoding
//! for column-aware storage, and back. A second surface encodes documents
//! as order-preserving index keys over a declared column prefix.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------+
//! |   Record Codec (RecordCoder)            |
//! |   Index-Key Codec (encode_index_key)    |
//! +-----------------------------------------+
//! |   Conversion Matrix  |  Container       |
//! |   (convert)          |  Sub-Codec       |
//! +-----------------------------------------+
//! |   Document Model (DocView/DocBuilder)   |
//! +-----------------------------------------+
//! |   Primitive I/O (varint/buffer/reader)  |
//! +-----------------------------------------+
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use docpack::{
//!     ColumnDef, ColumnMeta, ColumnType, DocBuilder, DocView, ElemType,
//!     RecordCoder, Schema, SCHEMA_LESS_FIELD,
//! };
//!
//! # fn main() -> eyre::Result<()> {
//! let schema = Schema::new(vec![
//!     ColumnDef::new("id", ColumnMeta::new(ColumnType::Sint64, ElemType::Int64)),
//!     ColumnDef::new("name", ColumnMeta::new(ColumnType::StrZero, ElemType::String)),
//!     ColumnDef::new(
//!         SCHEMA_LESS_FIELD,
//!         ColumnMeta::new(ColumnType::CarBin, ElemType::Object),
//!     ),
//! ])?;
//!
//! let mut builder = DocBuilder::new();
//! builder.append_i64("id", 7).append_str("name", "ada").append_bool("vip", true);
//! let doc = builder.finish();
//!
//! let mut coder = RecordCoder::new();
//! let record = coder.encode_to_vec(&schema, None, &DocView::new(&doc)?)?;
//! let restored = RecordCoder::decode(&schema, &record)?;
//! assert_eq!(restored, doc);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Notes
//!
//! - Declared columns are stored without tags or names; the schema supplies
//!   both on decode. Unmatched fields ride in a self-describing tail when
//!   the schema ends with the `"$$"` column.
//! - Nested arrays are type-compressed: one tag when homogeneous, the
//!   `0x81` sentinel plus per-item tags otherwise. Indices are never
//!   stored.
//! - Numeric width conversions are lossy but bounded: integers wrap on
//!   narrowing, doubles clamp at the target's bounds.
//! - All multi-byte scalars are little-endian.
//!
//! ## Concurrency
//!
//! A `RecordCoder` keeps two scratch buffers between calls and is not safe
//! for concurrent use; instantiate one per worker. Everything else is
//! stateless functions over borrowed slices.

pub mod doc;
pub mod encoding;
pub mod error;
pub mod records;

pub use doc::{ArrayBuilder, DocBuilder, DocElem, DocIter, DocView, ElemType, OID_SIZE};
pub use error::CodecError;
pub use records::{
    decode_index_key, encode_index_key, fields_equal, ColumnDef, ColumnMeta, ColumnType,
    RecordCoder, Schema, HETEROGENEOUS_TAG, MAX_NESTING_DEPTH, SCHEMA_LESS_FIELD,
};

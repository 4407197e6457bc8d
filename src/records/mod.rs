//! # Schema-Directed Record Encoding
//!
//! This module is the codec proper: it crosses the dynamically-typed
//! document model with a statically-typed column schema and back.
//!
//! ## Record Binary Layout
//!
//! ```text
//! +---------------------------+---------------------------------+
//! | declared column payloads  | schema-less tail (optional)     |
//! | in schema order           | tag | name | value, repeated    |
//! +---------------------------+---------------------------------+
//! ```
//!
//! Declared columns carry no tags or names; the schema supplies both on
//! decode. The tail is present only when the schema ends with the `"$$"`
//! column and holds unmatched fields in original document order. The
//! record has no terminator; the consumer knows its length.
//!
//! ## Module Structure
//!
//! - `schema`: `ColumnType`, `ColumnMeta`, `ColumnDef`, `Schema`
//! - `convert`: numeric/string conversion matrix
//! - `subdoc`: schema-agnostic nested object/array sub-codec
//! - `coder`: `RecordCoder` encode/decode and `fields_equal`
//! - `index_key`: order-preserving index-key codec

pub mod coder;
pub mod convert;
pub mod index_key;
pub mod schema;
pub mod subdoc;


pub use coder::{fields_equal, RecordCoder};
pub use index_key::{decode_index_key, encode_index_key};
pub use schema::{ColumnDef, ColumnMeta, ColumnType, Schema, SCHEMA_LESS_FIELD};
pub use subdoc::{HETEROGENEOUS_TAG, MAX_NESTING_DEPTH};

//! # Document Model
//!
//! The self-describing document format consumed and produced by the codec:
//! a tagged tree with one-byte type tags, NUL-terminated field names, and
//! little-endian length prefixes on strings and containers. A document is
//! `i32 LE total length | elements | 0x00`.
//!
//! ## Module Structure
//!
//! - `types`: element type tags (`ElemType`)
//! - `view`: zero-copy reading (`DocView`, `DocElem`, `DocIter`)
//! - `builder`: document construction (`DocBuilder`, `ArrayBuilder`)

pub mod builder;
pub mod types;
pub mod view;

pub use builder::{ArrayBuilder, DocBuilder};
pub use types::{ElemType, OID_SIZE};
pub use view::{DocElem, DocIter, DocView};

//! # Codec Error Kinds
//!
//! Every failure surfaced by the codec carries one of four kinds. The kinds
//! are attached as the root cause of the `eyre::Report`, so callers that need
//! to distinguish them can downcast:
//!
//! ```ignore
//! match err.downcast_ref::<CodecError>() {
//!     Some(CodecError::InvalidEncoding(_)) => { /* corrupt input */ }
//!     _ => { /* caller bug */ }
//! }
//! ```
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `InvalidArgument` | Caller-supplied document or schema is unusable (duplicate field name, numeric text with trailing garbage, extra fields without a schema-less column) |
//! | `InvalidEncoding` | Stored bytes are corrupt or truncated (read past end, end-of-object mid-stream, nesting too deep) |
//! | `UnsupportedConversion` | Conversion is reserved or out of scope (Float128, containers in index keys) |
//! | `SchemaMismatch` | Document shape contradicts the schema (declared column missing, ObjectId column with wrong fixed length, Date column of the wrong width) |

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("unsupported conversion: {0}")]
    UnsupportedConversion(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}

//! # Column Schema
//!
//! A schema is an ordered list of `(name, ColumnMeta)` pairs. Column order
//! is authoritative: the record codec walks it on both encode and decode.
//! A schema may end with a distinguished column named `"$$"` that captures
//! every document field not matched by a declared column (the schema-less
//! tail); it is only valid in last position.
//!
//! `ColumnMeta` carries the storage type, the fixed byte length for `Fixed`
//! columns, and the element type the value materialises as on decode.

use crate::doc::ElemType;
use crate::error::CodecError;
use eyre::{ensure, Result};
use hashbrown::HashMap;

/// Name of the schema-less tail column.
pub const SCHEMA_LESS_FIELD: &str = "$$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Sint08,
    Uint08,
    Sint16,
    Uint16,
    Sint32,
    Uint32,
    Sint64,
    Uint64,
    Float32,
    Float64,
    /// Reserved; every use fails with `UnsupportedConversion`.
    Float128,
    /// Fixed-length raw bytes (`fixed_len` of `ColumnMeta`).
    Fixed,
    /// Single NUL-terminated string; the last column may elide the NUL.
    StrZero,
    /// Two consecutive NUL-terminated strings (regex pattern + options).
    TwoStrZero,
    /// Length-byte-prefixed short binary text.
    Binary,
    /// Container binary: a 4-byte LE length prefix followed by a
    /// sub-encoded object, array, code-with-scope, or binary payload.
    CarBin,
}

#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub col_type: ColumnType,
    /// Byte length for `Fixed` columns; unused otherwise.
    pub fixed_len: usize,
    /// Element type the stored value becomes on decode.
    pub u_type: ElemType,
}

impl ColumnMeta {
    pub fn new(col_type: ColumnType, u_type: ElemType) -> Self {
        Self {
            col_type,
            fixed_len: 0,
            u_type,
        }
    }

    pub fn fixed(fixed_len: usize, u_type: ElemType) -> Self {
        Self {
            col_type: ColumnType::Fixed,
            fixed_len,
            u_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub meta: ColumnMeta,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, meta: ColumnMeta) -> Self {
        Self {
            name: name.into(),
            meta,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnDef>,
    by_name: HashMap<String, usize>,
    has_schema_less: bool,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(columns.len());
        for (idx, col) in columns.iter().enumerate() {
            ensure!(
                col.name != SCHEMA_LESS_FIELD || idx == columns.len() - 1,
                CodecError::InvalidArgument(format!(
                    "schema-less column \"{}\" must be the last column",
                    SCHEMA_LESS_FIELD
                ))
            );
            ensure!(
                by_name.insert(col.name.clone(), idx).is_none(),
                CodecError::InvalidArgument(format!("duplicate column name: {}", col.name))
            );
        }
        let has_schema_less = columns
            .last()
            .is_some_and(|c| c.name == SCHEMA_LESS_FIELD);
        Ok(Self {
            columns,
            by_name,
            has_schema_less,
        })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of declared columns, excluding the schema-less tail column.
    pub fn declared_count(&self) -> usize {
        self.column_count() - self.has_schema_less as usize
    }

    pub fn has_schema_less_tail(&self) -> bool {
        self.has_schema_less
    }

    pub fn column(&self, idx: usize) -> &ColumnDef {
        &self.columns[idx]
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

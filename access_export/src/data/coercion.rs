//! Row coercion
//!
//! Every value is converted explicitly before it reaches a target:
//!
//! | source value | target value |
//! |---|---|
//! | boolean | integer `1` / `0` |
//! | timestamp | ISO-8601 text, millisecond precision |
//! | integer | integer |
//! | float | real |
//! | decimal | text, converted by the column affinity |
//! | text | text |
//! | binary | blob |
//!
//! The SQLite and CSV targets share this conversion, so both store booleans
//! and timestamps the same way.

use crate::error::Result;
use crate::schema::typemap::TypeMapper;
use crate::schema::types::Table;
use crate::source::{Row, SourceValue};

/// `2024-02-29T13:45:10.250`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A value ready to be bound to a statement or written to a file
#[derive(Debug, Clone, PartialEq)]
pub enum TargetValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl TargetValue {
    /// Render the value as a flat-file field
    pub fn to_field(&self) -> String {
        match self {
            TargetValue::Null => String::new(),
            TargetValue::Integer(n) => n.to_string(),
            TargetValue::Real(x) => x.to_string(),
            TargetValue::Text(s) => s.clone(),
            TargetValue::Blob(bytes) => hex::encode(bytes),
        }
    }
}

/// Convert one source value
pub fn coerce(value: &SourceValue) -> TargetValue {
    match value {
        SourceValue::Null => TargetValue::Null,
        SourceValue::Boolean(b) => TargetValue::Integer(i64::from(*b)),
        SourceValue::Timestamp(ts) => TargetValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
        SourceValue::Integer(n) => TargetValue::Integer(*n),
        SourceValue::Float(x) => TargetValue::Real(*x),
        SourceValue::Decimal(s) | SourceValue::Text(s) => TargetValue::Text(s.clone()),
        SourceValue::Binary(bytes) => TargetValue::Blob(bytes.clone()),
    }
}

/// Convert a row into one value per column of `table`, in declared column order
///
/// Fails if a column's type has no storage class.
pub fn coerce_row(table: &Table, type_mapper: &TypeMapper, row: &Row) -> Result<Vec<TargetValue>> {
    table
        .columns
        .iter()
        .map(|column| {
            type_mapper.map_column(table, column)?;
            Ok(coerce(row.get(&column.name)))
        })
        .collect()
}

//! JSON snapshot reader
//!
//! A snapshot is a JSON document holding the tables, indexes, relationships
//! and rows of a desktop database. The whole file is decoded and validated
//! when it is opened; afterwards the snapshot is read-only.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::types::{Column, DataType, DatabaseSchema, Index, Relationship, Table};
use crate::source::{Row, RowCursor, SourceDatabase, SourceValue};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSnapshot {
    #[serde(default)]
    tables: Vec<RawTable>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    name: String,
    columns: Vec<Column>,
    #[serde(default)]
    indexes: Vec<Index>,
    #[serde(default)]
    rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    #[serde(default)]
    name: String,
    from_table: String,
    from_columns: Vec<String>,
    to_table: String,
    to_columns: Vec<String>,
}

/// A source database loaded from a JSON snapshot
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    schema: DatabaseSchema,
    rows: HashMap<String, Vec<Row>>,
}

impl SnapshotSource {
    /// A source over an already built schema, without rows
    pub fn new(schema: DatabaseSchema) -> Self {
        Self {
            schema,
            rows: HashMap::new(),
        }
    }

    /// Attach rows to a table, builder style
    pub fn with_rows(mut self, table_name: &str, rows: Vec<Row>) -> Self {
        self.rows.insert(table_name.to_string(), rows);
        self
    }

    /// Open a snapshot file read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::SourceOpenError(format!("{}: {}", path.display(), e)))?;

        let source = Self::from_json_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            tables = source.schema.tables.len(),
            relationships = source.schema.relationships.len(),
            "Opened source snapshot"
        );
        Ok(source)
    }

    /// Decode and validate a snapshot document
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_str(contents)
            .map_err(|e| Error::SourceOpenError(format!("Invalid snapshot: {}", e)))?;

        let mut schema = DatabaseSchema::new();
        let mut rows = HashMap::new();

        for raw_table in raw.tables {
            if schema.get_table(&raw_table.name).is_some() {
                return Err(invalid(format!("duplicate table '{}'", raw_table.name)));
            }

            let table = build_table(raw_table.name, raw_table.columns, raw_table.indexes)?;
            let decoded = raw_table
                .rows
                .iter()
                .enumerate()
                .map(|(position, raw_row)| decode_row(&table, position, raw_row))
                .collect::<Result<Vec<_>>>()?;

            rows.insert(table.name.clone(), decoded);
            schema.add_table(table);
        }

        for raw_relationship in raw.relationships {
            let relationship = build_relationship(&schema, raw_relationship)?;
            schema.add_relationship(relationship);
        }

        Ok(Self { schema, rows })
    }
}

impl SourceDatabase for SnapshotSource {
    fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    fn rows(&self, table: &Table) -> Result<RowCursor<'_>> {
        match self.rows.get(&table.name) {
            Some(rows) => Ok(Box::new(rows.iter().cloned().map(Ok))),
            None if self.schema.get_table(&table.name).is_some() => {
                Ok(Box::new(std::iter::empty()))
            }
            None => Err(Error::SourceReadError(format!(
                "Table '{}' does not exist in the source",
                table.name
            ))),
        }
    }
}

fn invalid(message: String) -> Error {
    Error::SourceOpenError(format!("Invalid snapshot: {}", message))
}

fn build_table(name: String, columns: Vec<Column>, indexes: Vec<Index>) -> Result<Table> {
    let mut table = Table::new(&name);
    let mut seen = HashSet::new();

    for column in columns {
        if !seen.insert(column.name.clone()) {
            return Err(invalid(format!(
                "duplicate column '{}' in table '{}'",
                column.name, name
            )));
        }
        table.add_column(column);
    }

    let mut has_primary_key = false;
    for index in indexes {
        if let Some(unknown) = index.columns.iter().find(|c| !seen.contains(*c)) {
            return Err(invalid(format!(
                "index '{}' of table '{}' uses unknown column '{}'",
                index.name, name, unknown
            )));
        }
        if index.is_primary_key {
            if has_primary_key {
                return Err(invalid(format!("table '{}' has more than one primary key", name)));
            }
            has_primary_key = true;
        }

        table.add_index(Index {
            table_name: name.clone(),
            is_unique: index.is_unique || index.is_primary_key,
            ..index
        });
    }

    Ok(table)
}

fn build_relationship(schema: &DatabaseSchema, raw: RawRelationship) -> Result<Relationship> {
    let lookup = |table_name: &str, columns: &[String]| -> Result<Arc<Table>> {
        let table = schema.get_table(table_name).ok_or_else(|| {
            invalid(format!(
                "relationship '{}' references unknown table '{}'",
                raw.name, table_name
            ))
        })?;
        if let Some(unknown) = columns.iter().find(|c| table.get_column(c).is_none()) {
            return Err(invalid(format!(
                "relationship '{}' uses unknown column '{}' of table '{}'",
                raw.name, unknown, table_name
            )));
        }
        Ok(Arc::clone(table))
    };

    let from_table = lookup(&raw.from_table, &raw.from_columns)?;
    let to_table = lookup(&raw.to_table, &raw.to_columns)?;

    if raw.from_columns.len() != raw.to_columns.len() || raw.to_columns.is_empty() {
        return Err(invalid(format!(
            "relationship '{}' must pair the same non-zero number of columns",
            raw.name
        )));
    }

    Ok(Relationship {
        name: raw.name,
        from_table,
        from_columns: raw.from_columns,
        to_table,
        to_columns: raw.to_columns,
    })
}

fn decode_row(table: &Table, position: usize, raw: &Map<String, Value>) -> Result<Row> {
    if let Some(unknown) = raw.keys().find(|k| table.get_column(k).is_none()) {
        return Err(invalid(format!(
            "row {} of table '{}' has unknown column '{}'",
            position, table.name, unknown
        )));
    }

    table
        .columns
        .iter()
        .map(|column| {
            let value = raw.get(&column.name).unwrap_or(&Value::Null);
            decode_value(column.data_type, value)
                .map(|decoded| (column.name.clone(), decoded))
                .map_err(|message| {
                    invalid(format!(
                        "row {} of table '{}', column '{}': {}",
                        position, table.name, column.name, message
                    ))
                })
        })
        .collect()
}

/// Decode a JSON value according to the declared column type
pub(crate) fn decode_value(
    data_type: DataType,
    value: &Value,
) -> std::result::Result<SourceValue, String> {
    if value.is_null() {
        return Ok(SourceValue::Null);
    }

    match data_type {
        DataType::Boolean => value
            .as_bool()
            .map(SourceValue::Boolean)
            .ok_or_else(|| expected("a boolean", value)),

        DataType::Byte => decode_integer(value, 0, u8::MAX as i64),
        DataType::Int => decode_integer(value, i16::MIN as i64, i16::MAX as i64),
        DataType::Long => decode_integer(value, i32::MIN as i64, i32::MAX as i64),
        DataType::BigInt => decode_integer(value, i64::MIN, i64::MAX),

        DataType::Float | DataType::Double => value
            .as_f64()
            .map(SourceValue::Float)
            .ok_or_else(|| expected("a number", value)),

        DataType::Money | DataType::Numeric => match value {
            Value::Number(n) => Ok(SourceValue::Decimal(n.to_string())),
            Value::String(s) if s.trim().parse::<f64>().is_ok() => {
                Ok(SourceValue::Decimal(s.trim().to_string()))
            }
            _ => Err(expected("a decimal number", value)),
        },

        DataType::Text | DataType::Memo | DataType::Guid => value
            .as_str()
            .map(|s| SourceValue::Text(s.to_string()))
            .ok_or_else(|| expected("a string", value)),

        DataType::Binary | DataType::Ole => decode_bytes(value),

        DataType::ShortDateTime | DataType::ExtDateTime => value
            .as_str()
            .and_then(parse_timestamp)
            .map(SourceValue::Timestamp)
            .ok_or_else(|| expected("a timestamp", value)),

        // Kept verbatim; the column is rejected when the schema is generated
        DataType::ComplexType | DataType::Unsupported => Ok(SourceValue::Text(value.to_string())),
    }
}

fn expected(what: &str, value: &Value) -> String {
    format!("expected {}, found {}", what, value)
}

fn decode_integer(value: &Value, min: i64, max: i64) -> std::result::Result<SourceValue, String> {
    match value.as_i64() {
        Some(n) if (min..=max).contains(&n) => Ok(SourceValue::Integer(n)),
        Some(n) => Err(format!("{} is out of range {}..={}", n, min, max)),
        None => Err(expected("an integer", value)),
    }
}

fn decode_bytes(value: &Value) -> std::result::Result<SourceValue, String> {
    let items = value
        .as_array()
        .ok_or_else(|| expected("an array of bytes", value))?;

    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| expected("a byte", item))
        })
        .collect::<std::result::Result<Vec<u8>, String>>()
        .map(SourceValue::Binary)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

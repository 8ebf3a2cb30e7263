//! Type definitions for source database schema objects
//!
//! The schema is an immutable snapshot taken once per export run. Tables are
//! shared behind [`Arc`] so that relationships can point at the exact table
//! they connect instead of repeating its name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Error;

/// Semantic type of a source column, independent of its on-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Boolean,
    Byte,
    /// 16-bit integer
    Int,
    /// 32-bit integer
    Long,
    Money,
    Float,
    Double,
    ShortDateTime,
    Binary,
    Text,
    /// Large binary object
    Ole,
    /// Long text
    Memo,
    Guid,
    Numeric,
    ComplexType,
    BigInt,
    ExtDateTime,
    Unsupported,
}

impl DataType {
    /// Every semantic type, in declaration order
    pub const ALL: [DataType; 18] = [
        DataType::Boolean,
        DataType::Byte,
        DataType::Int,
        DataType::Long,
        DataType::Money,
        DataType::Float,
        DataType::Double,
        DataType::ShortDateTime,
        DataType::Binary,
        DataType::Text,
        DataType::Ole,
        DataType::Memo,
        DataType::Guid,
        DataType::Numeric,
        DataType::ComplexType,
        DataType::BigInt,
        DataType::ExtDateTime,
        DataType::Unsupported,
    ];

    /// The snake_case name used in snapshots and configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Byte => "byte",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Money => "money",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::ShortDateTime => "short_date_time",
            DataType::Binary => "binary",
            DataType::Text => "text",
            DataType::Ole => "ole",
            DataType::Memo => "memo",
            DataType::Guid => "guid",
            DataType::Numeric => "numeric",
            DataType::ComplexType => "complex_type",
            DataType::BigInt => "big_int",
            DataType::ExtDateTime => "ext_date_time",
            DataType::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .iter()
            .copied()
            .find(|data_type| data_type.as_str() == s)
            .ok_or_else(|| Error::ConfigError(format!("Unknown data type: {}", s)))
    }
}

/// Represents the structure of a complete source database
#[derive(Debug, Clone, Default)]
pub struct DatabaseSchema {
    pub tables: Vec<Arc<Table>>,
    pub relationships: Vec<Relationship>,
}

impl DatabaseSchema {
    /// Create a new empty database schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the schema and return the shared handle to it
    pub fn add_table(&mut self, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        self.tables.push(Arc::clone(&table));
        table
    }

    /// Add a relationship to the schema
    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    /// Find a table by its exact name
    pub fn get_table(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table names in source enumeration order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Represents a source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Add a column to the table
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Add an index owned by this table
    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(Index {
            table_name: self.name.clone(),
            ..index
        });
    }

    /// Append a column, builder style
    pub fn column(mut self, name: &str, data_type: DataType) -> Self {
        self.add_column(Column::new(name, data_type));
        self
    }

    /// Append an index owned by this table, builder style
    pub fn index(mut self, index: Index) -> Self {
        self.add_index(index);
        self
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The index flagged as primary key, if the table has one
    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes.iter().find(|idx| idx.is_primary_key)
    }

    /// Columns of the primary key in index order; empty without a primary key
    pub fn primary_key_columns(&self) -> &[String] {
        self.primary_key()
            .map(|pk| pk.columns.as_slice())
            .unwrap_or(&[])
    }
}

/// Represents a source column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl Column {
    /// Create a new column with the given name and type
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
        }
    }
}

/// Represents an index on a source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    /// Name of the owning table
    #[serde(default)]
    pub table_name: String,
    pub columns: Vec<String>,
    #[serde(default, rename = "primary_key")]
    pub is_primary_key: bool,
    #[serde(default, rename = "unique")]
    pub is_unique: bool,
}

impl Index {
    /// Create a plain, non-unique index
    pub fn new(table_name: &str, name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            table_name: table_name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            is_primary_key: false,
            is_unique: false,
        }
    }

    /// Mark the index unique
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Mark the index as the primary key; primary keys are always unique
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_unique = true;
        self
    }

    /// The participating columns without regard to order
    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

/// A relationship between a referenced table (`from`) and a referencing table (`to`)
#[derive(Debug, Clone)]
pub struct Relationship {
    pub name: String,
    pub from_table: Arc<Table>,
    pub from_columns: Vec<String>,
    pub to_table: Arc<Table>,
    pub to_columns: Vec<String>,
}

impl Relationship {
    /// Whether `table` is the referencing side of this relationship
    pub fn is_referenced_from(&self, table: &Table) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.to_table), table) || *self.to_table == *table
    }
}

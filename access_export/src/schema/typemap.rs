//! Mapping of source semantic types to SQLite storage classes
//!
//! SQLite has no boolean, currency or date type: those are stored as
//! integers. See <https://www.sqlite.org/datatype3.html>.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::config::TypeMappingConfig;
use crate::error::{Error, Result};
use crate::schema::types::{Column, DataType, Table};

/// Storage class of a target column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    Integer,
    Real,
    Text,
    Blob,
}

impl StorageClass {
    /// The type name written into `CREATE TABLE`
    pub fn as_sql(&self) -> &'static str {
        match self {
            StorageClass::Integer => "INTEGER",
            StorageClass::Real => "REAL",
            StorageClass::Text => "TEXT",
            StorageClass::Blob => "BLOB",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Built-in storage class of a semantic type, `None` when unsupported
pub fn default_storage_class(data_type: DataType) -> Option<StorageClass> {
    match data_type {
        DataType::Binary | DataType::Ole => Some(StorageClass::Blob),

        DataType::Boolean
        | DataType::Byte
        | DataType::Int
        | DataType::Long
        | DataType::Money
        | DataType::ShortDateTime => Some(StorageClass::Integer),

        DataType::Double | DataType::Float | DataType::Numeric => Some(StorageClass::Real),

        DataType::Text | DataType::Guid | DataType::Memo => Some(StorageClass::Text),

        DataType::ComplexType
        | DataType::BigInt
        | DataType::ExtDateTime
        | DataType::Unsupported => None,
    }
}

/// Resolves storage classes from the built-in table plus configured overrides
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    overrides: HashMap<DataType, StorageClass>,
}

impl TypeMapper {
    /// A mapper using only the built-in table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapper from the `[type_mapping]` configuration section
    pub fn from_config(config: &TypeMappingConfig) -> Result<Self> {
        let mut overrides = HashMap::new();
        for (name, class) in &config.overrides {
            overrides.insert(name.parse::<DataType>()?, *class);
        }
        Ok(Self { overrides })
    }

    /// Map a single override, builder style
    pub fn with_override(mut self, data_type: DataType, class: StorageClass) -> Self {
        self.overrides.insert(data_type, class);
        self
    }

    /// Storage class for a semantic type, `None` when the type cannot be stored
    pub fn storage_class(&self, data_type: DataType) -> Option<StorageClass> {
        self.overrides
            .get(&data_type)
            .copied()
            .or_else(|| default_storage_class(data_type))
    }

    /// Storage class for a column of `table`, failing loudly on unsupported types
    pub fn map_column(&self, table: &Table, column: &Column) -> Result<StorageClass> {
        self.storage_class(column.data_type)
            .ok_or_else(|| Error::UnsupportedType {
                table: table.name.clone(),
                column: column.name.clone(),
                data_type: column.data_type,
            })
    }
}

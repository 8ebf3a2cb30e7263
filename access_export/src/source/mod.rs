//! Source database access
//!
//! A source database is read through [`SourceDatabase`]: an immutable schema
//! snapshot plus a row cursor per table. [`SnapshotSource`] reads a JSON
//! snapshot of a desktop database.

pub mod snapshot;

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::error::Result;
use crate::schema::types::{DatabaseSchema, Table};

pub use snapshot::SnapshotSource;

/// Rows of one table in the source's natural order
pub type RowCursor<'a> = Box<dyn Iterator<Item = Result<Row>> + Send + 'a>;

/// Read-only access to a source database
pub trait SourceDatabase: Send + Sync {
    /// The schema snapshot taken when the source was opened
    fn schema(&self) -> &DatabaseSchema;

    /// Iterate the rows of `table`
    fn rows(&self, table: &Table) -> Result<RowCursor<'_>>;
}

/// A value as read from the source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Exact decimal kept as its textual form
    Decimal(String),
    Text(String),
    Binary(Vec<u8>),
    Timestamp(NaiveDateTime),
}

static NULL: SourceValue = SourceValue::Null;

/// One source row, values keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: IndexMap<String, SourceValue>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of a column
    pub fn insert(&mut self, column: &str, value: SourceValue) {
        self.values.insert(column.to_string(), value);
    }

    /// Set the value of a column, builder style
    pub fn with(mut self, column: &str, value: SourceValue) -> Self {
        self.insert(column, value);
        self
    }

    /// The value of a column; columns absent from the row are null
    pub fn get(&self, column: &str) -> &SourceValue {
        self.values.get(column).unwrap_or(&NULL)
    }

    /// Number of columns present in the row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, SourceValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SourceValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

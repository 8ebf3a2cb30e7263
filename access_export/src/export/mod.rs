//! Export orchestration
//!
//! An export run filters the source tables, lets the sink create their
//! structure, then streams every table's rows into the sink:
//!
//! ```text
//! START -> FILTER_TABLES -> CREATE_SCHEMA -> LOAD_DATA -> COMMIT -> DONE
//! ```
//!
//! Any failure aborts the sink and ends the run. For [`SqliteSink`] that means
//! the whole transaction is rolled back; [`CsvSink`] keeps files that were
//! already completed.

pub mod csv;
pub mod sqlite;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::types::{DatabaseSchema, Table};
use crate::source::{RowCursor, SourceDatabase};

pub use self::csv::CsvSink;
pub use self::sqlite::SqliteSink;

/// Which source tables an export run processes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableFilter {
    /// No filter was requested: every table
    #[default]
    All,
    /// An explicit allow-list of exact, case-sensitive names; may be empty
    Only(BTreeSet<String>),
}

impl TableFilter {
    /// An explicit allow-list
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TableFilter::Only(names.into_iter().map(Into::into).collect())
    }

    /// `None` means no filter; `Some` is an allow-list even when it is empty
    pub fn from_option(names: Option<Vec<String>>) -> Self {
        match names {
            None => TableFilter::All,
            Some(names) => TableFilter::only(names.into_iter().filter(|n| !n.is_empty())),
        }
    }

    /// Whether a table with this name is part of the working set
    pub fn includes(&self, table_name: &str) -> bool {
        match self {
            TableFilter::All => true,
            TableFilter::Only(names) => names.contains(table_name),
        }
    }
}

/// What an export run wrote
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportSummary {
    pub tables_created: usize,
    pub indexes_created: usize,
    /// Rows written per table, in export order
    pub rows: IndexMap<String, u64>,
}

impl ExportSummary {
    /// Rows written across all tables
    pub fn total_rows(&self) -> u64 {
        self.rows.values().sum()
    }

    /// Names of the tables whose rows were written
    pub fn tables(&self) -> Vec<&str> {
        self.rows.keys().map(String::as_str).collect()
    }
}

/// Destination of an export run
#[async_trait]
pub trait Sink: Send {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Prepare for writing; called once before anything else
    async fn begin(&mut self) -> Result<()>;

    /// Create target structure for `tables`
    ///
    /// `schema` is the entire source schema, so relationships to tables outside
    /// the working set are still visible.
    async fn create_schema(
        &mut self,
        schema: &DatabaseSchema,
        tables: &[Arc<Table>],
        summary: &mut ExportSummary,
    ) -> Result<()>;

    /// Write every row of `table`, returning the number written
    async fn write_rows(&mut self, table: &Table, rows: RowCursor<'_>) -> Result<u64>;

    /// Make everything written permanent
    async fn commit(&mut self) -> Result<()>;

    /// Give up after a failure; never fails itself
    async fn abort(&mut self);
}

/// Drives one export run from a source into a sink
pub struct Exporter<'a> {
    source: &'a dyn SourceDatabase,
    filter: TableFilter,
}

impl<'a> Exporter<'a> {
    /// Export every table of `source`
    pub fn new(source: &'a dyn SourceDatabase) -> Self {
        Self {
            source,
            filter: TableFilter::All,
        }
    }

    /// Restrict the run to the tables accepted by `filter`
    pub fn with_filter(mut self, filter: TableFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The working table set, in source enumeration order
    pub fn working_tables(&self) -> Vec<Arc<Table>> {
        let schema = self.source.schema();
        tracing::debug!(tables = ?schema.table_names(), "Source tables");

        if let TableFilter::Only(names) = &self.filter {
            for name in names {
                if schema.get_table(name).is_none() {
                    tracing::warn!(table = %name, "Requested table does not exist in the source");
                }
            }
        }

        schema
            .tables
            .iter()
            .filter(|table| self.filter.includes(&table.name))
            .cloned()
            .collect()
    }

    /// Run the export; on failure the sink is aborted before the error is returned
    pub async fn export(&self, sink: &mut dyn Sink) -> Result<ExportSummary> {
        let tables = self.working_tables();
        tracing::info!(
            sink = sink.name(),
            tables = tables.len(),
            "Starting export"
        );

        match self.run(sink, &tables).await {
            Ok(summary) => {
                tracing::info!(
                    sink = sink.name(),
                    tables = summary.rows.len(),
                    indexes = summary.indexes_created,
                    rows = summary.total_rows(),
                    "Export finished"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(sink = sink.name(), error = %e, "Export failed");
                sink.abort().await;
                Err(e)
            }
        }
    }

    async fn run(&self, sink: &mut dyn Sink, tables: &[Arc<Table>]) -> Result<ExportSummary> {
        let mut summary = ExportSummary::default();

        sink.begin().await?;
        sink.create_schema(self.source.schema(), tables, &mut summary)
            .await?;

        for table in tables {
            tracing::info!(table = %table.name, "Exporting table");
            let rows = self.source.rows(table)?;
            let count = sink.write_rows(table, rows).await?;
            tracing::info!(table = %table.name, rows = count, "Exported table");
            summary.rows.insert(table.name.clone(), count);
        }

        sink.commit().await?;
        Ok(summary)
    }
}

/// The source must exist
pub fn check_source(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// A SQLite target must not exist yet
pub fn check_sqlite_target(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::TargetExists(path.to_path_buf()));
    }
    Ok(())
}

/// A CSV target must be an existing directory
pub fn check_csv_target(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::InvalidTargetDirectory(path.to_path_buf()));
    }
    Ok(())
}

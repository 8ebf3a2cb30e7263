//! CSV sink
//!
//! Each table of the working set becomes one file `<table>.<extension>` in the
//! target directory. Tables are written independently; there is no
//! transaction and files completed before a failure are kept.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::CsvConfig;
use crate::data::{coerce_row, TargetValue};
use crate::error::Result;
use crate::export::{ExportSummary, Sink};
use crate::schema::typemap::TypeMapper;
use crate::schema::types::{DatabaseSchema, Table};
use crate::source::RowCursor;
use crate::utils::naming::format_file_name;

/// Writes an export as a directory of CSV files
pub struct CsvSink {
    directory: PathBuf,
    config: CsvConfig,
    delimiter: u8,
    type_mapper: TypeMapper,
    files: Vec<PathBuf>,
}

impl CsvSink {
    /// Fails if the configured delimiter is not a single ASCII character
    pub fn new(directory: impl AsRef<Path>, config: CsvConfig, type_mapper: TypeMapper) -> Result<Self> {
        let delimiter = config.delimiter_byte()?;

        Ok(Self {
            directory: directory.as_ref().to_path_buf(),
            config,
            delimiter,
            type_mapper,
            files: Vec::new(),
        })
    }

    /// Path of the file `table` is written to
    pub fn file_path(&self, table: &Table) -> PathBuf {
        self.directory
            .join(format_file_name(&table.name, &self.config.extension))
    }

    /// Files completed so far
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

#[async_trait]
impl Sink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    // Flat files carry no keys, indexes or relationships; only the column
    // types are checked, before any file is created
    async fn create_schema(
        &mut self,
        _schema: &DatabaseSchema,
        tables: &[Arc<Table>],
        _summary: &mut ExportSummary,
    ) -> Result<()> {
        for table in tables {
            for column in &table.columns {
                self.type_mapper.map_column(table, column)?;
            }
        }
        Ok(())
    }

    async fn write_rows(&mut self, table: &Table, rows: RowCursor<'_>) -> Result<u64> {
        let path = self.file_path(table);
        let mut writer = ::csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(&path)?;

        if self.config.header {
            writer.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
        }

        let mut count = 0;
        for row in rows {
            let row = row?;
            let values = coerce_row(table, &self.type_mapper, &row)?;
            writer.write_record(values.iter().map(TargetValue::to_field))?;
            count += 1;
        }

        writer.flush()?;
        tracing::debug!(table = %table.name, path = %path.display(), "Wrote file");
        self.files.push(path);

        Ok(count)
    }

    async fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    async fn abort(&mut self) {
        if !self.files.is_empty() {
            tracing::warn!(
                files = self.files.len(),
                directory = %self.directory.display(),
                "Keeping files written before the failure"
            );
        }
    }
}

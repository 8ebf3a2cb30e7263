//! access_export: exports a desktop database into SQLite or CSV files
//!
//! The source schema (tables, typed columns, indexes and relationships) is
//! translated into SQLite statements, redundant indexes are dropped, and all
//! rows are type-converted and loaded inside one transaction. The CSV target
//! writes one file per table instead.

pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod export;
pub mod schema;
pub mod source;
pub mod utils;

use std::path::{Path, PathBuf};

// Re-export main types for easier access
pub use config::{Config, ExportFormat};
pub use db::connection::DatabaseConnection;
pub use error::{Error, Result};
pub use export::{CsvSink, ExportSummary, Exporter, Sink, SqliteSink, TableFilter};
pub use schema::generator::{SqlGenerator, SqliteGenerator};
pub use schema::typemap::TypeMapper;
pub use source::{SnapshotSource, SourceDatabase};

/// One export run as requested on the command line
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub source: PathBuf,
    pub target: PathBuf,
    pub format: ExportFormat,
    pub filter: TableFilter,
}

/// The main client for running exports
pub struct AccessExportClient {
    config: Config,
    type_mapper: TypeMapper,
}

impl AccessExportClient {
    /// Create a client from configuration
    pub fn new(config: Config) -> Result<Self> {
        let type_mapper = TypeMapper::from_config(&config.type_mapping)?;
        Ok(Self {
            config,
            type_mapper,
        })
    }

    /// Check preconditions, open the source snapshot and export it
    ///
    /// Preconditions are checked before anything is opened: a missing source
    /// first, then a target that is unusable for the requested format.
    pub async fn run(&self, request: &ExportRequest) -> Result<ExportSummary> {
        export::check_source(&request.source)?;
        Self::check_target(request.format, &request.target)?;

        let source = SnapshotSource::open(&request.source)?;

        match request.format {
            ExportFormat::Sqlite => {
                self.export_to_sqlite(&source, request.filter.clone(), &request.target)
                    .await
            }
            ExportFormat::Csv => {
                self.export_to_csv(&source, request.filter.clone(), &request.target)
                    .await
            }
        }
    }

    /// Export into a new SQLite database file at `target`
    pub async fn export_to_sqlite(
        &self,
        source: &dyn SourceDatabase,
        filter: TableFilter,
        target: &Path,
    ) -> Result<ExportSummary> {
        Self::check_target(ExportFormat::Sqlite, target)?;

        let connection = DatabaseConnection::connect(target).await?;
        let generator = SqliteGenerator::new(self.type_mapper.clone());
        let mut sink = SqliteSink::new(connection.clone(), generator);

        let result = Exporter::new(source)
            .with_filter(filter)
            .export(&mut sink)
            .await;

        connection.close().await;
        result
    }

    /// Export one CSV file per table into the existing `directory`
    pub async fn export_to_csv(
        &self,
        source: &dyn SourceDatabase,
        filter: TableFilter,
        directory: &Path,
    ) -> Result<ExportSummary> {
        Self::check_target(ExportFormat::Csv, directory)?;

        let mut sink = CsvSink::new(directory, self.config.csv.clone(), self.type_mapper.clone())?;

        Exporter::new(source)
            .with_filter(filter)
            .export(&mut sink)
            .await
    }

    fn check_target(format: ExportFormat, target: &Path) -> Result<()> {
        match format {
            ExportFormat::Sqlite => export::check_sqlite_target(target),
            ExportFormat::Csv => export::check_csv_target(target),
        }
    }
}

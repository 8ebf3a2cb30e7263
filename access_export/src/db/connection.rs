//! Target database connection handling
//!
//! This module opens the SQLite database an export is written into.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};

use crate::error::{Error, Result};

/// Connection to the SQLite target
///
/// The pool holds a single connection, so every statement of a run goes
/// through the same transaction.
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool<Sqlite>,
    path: PathBuf,
}

impl DatabaseConnection {
    /// Open the target file, creating it if it does not exist
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Foreign keys are recreated but not enforced while loading
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .foreign_keys(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| Error::TargetOpenError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "Opened target database");

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    /// Path of the target file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Start the transaction an export run is loaded in
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Close the connection, flushing the file
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

//! SQLite sink
//!
//! The whole run happens in one transaction on the target's single
//! connection. Tables are created first, then their indexes, then all rows are
//! inserted through one prepared statement per table.

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use std::sync::Arc;

use crate::data::coerce_row;
use crate::db::{executor, DatabaseConnection};
use crate::error::{Error, Result};
use crate::export::{ExportSummary, Sink};
use crate::schema::generator::{SqlGenerator, SqliteGenerator};
use crate::schema::indexes::deduplicate_indexes;
use crate::schema::types::{DatabaseSchema, Table};
use crate::source::RowCursor;

/// Writes an export into a SQLite database file
pub struct SqliteSink {
    connection: DatabaseConnection,
    generator: SqliteGenerator,
    transaction: Option<Transaction<'static, Sqlite>>,
}

impl SqliteSink {
    pub fn new(connection: DatabaseConnection, generator: SqliteGenerator) -> Self {
        Self {
            connection,
            generator,
            transaction: None,
        }
    }

    /// The target this sink writes to
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

fn open_transaction<'a>(
    transaction: &'a mut Option<Transaction<'static, Sqlite>>,
) -> Result<&'a mut Transaction<'static, Sqlite>> {
    transaction
        .as_mut()
        .ok_or_else(|| Error::ExportError("no transaction is open on the target".to_string()))
}

#[async_trait]
impl Sink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn begin(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(Error::ExportError(
                "a transaction is already open on the target".to_string(),
            ));
        }
        self.transaction = Some(self.connection.begin().await?);
        tracing::debug!(path = %self.connection.path().display(), "Started transaction");
        Ok(())
    }

    async fn create_schema(
        &mut self,
        schema: &DatabaseSchema,
        tables: &[Arc<Table>],
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let tx = open_transaction(&mut self.transaction)?;

        for table in tables {
            let mut statements = vec![self.generator.create_table(table, &schema.relationships)?];
            statements.extend(
                deduplicate_indexes(table)
                    .into_iter()
                    .map(|index| self.generator.create_index(index)),
            );

            executor::execute_batch(&mut **tx, &statements).await?;
            summary.tables_created += 1;
            summary.indexes_created += statements.len() - 1;

            tracing::info!(
                table = %table.name,
                indexes = statements.len() - 1,
                "Created table"
            );
        }

        Ok(())
    }

    async fn write_rows(&mut self, table: &Table, rows: RowCursor<'_>) -> Result<u64> {
        let tx = open_transaction(&mut self.transaction)?;
        let sql = self.generator.insert_into_table(table);
        tracing::debug!(table = %table.name, sql = %sql, "Prepared insert");

        let mut count = 0;
        for row in rows {
            let row = row?;
            let values = coerce_row(table, self.generator.type_mapper(), &row)?;
            executor::execute_with_values(&mut **tx, &sql, &values).await?;
            count += 1;
        }

        Ok(count)
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| Error::ExportError("no transaction is open on the target".to_string()))?;
        tx.commit().await?;
        tracing::debug!(path = %self.connection.path().display(), "Committed transaction");
        Ok(())
    }

    async fn abort(&mut self) {
        if let Some(tx) = self.transaction.take() {
            match tx.rollback().await {
                Ok(()) => tracing::info!(
                    path = %self.connection.path().display(),
                    "Rolled back transaction"
                ),
                Err(e) => tracing::warn!(
                    path = %self.connection.path().display(),
                    error = %e,
                    "Failed to roll back transaction"
                ),
            }
        }
    }
}

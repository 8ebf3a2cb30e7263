//! SQL executor
//!
//! Statements run on an explicitly passed connection, normally the export
//! run's open transaction.

use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqliteConnection};

use crate::data::TargetValue;
use crate::error::{Error, Result};

/// Execute a single statement
pub async fn execute(connection: &mut SqliteConnection, sql: &str) -> Result<()> {
    tracing::debug!(sql, "Executing SQL");

    sqlx::query(sql)
        .execute(connection)
        .await
        .map_err(|e| Error::execution(sql, e))?;

    Ok(())
}

/// Execute multiple statements in order, stopping at the first failure
pub async fn execute_batch(connection: &mut SqliteConnection, statements: &[String]) -> Result<()> {
    for statement in statements {
        execute(&mut *connection, statement).await?;
    }

    Ok(())
}

/// Execute a parameterised statement with one bound value per placeholder
///
/// The statement is prepared on first use and cached on the connection.
pub async fn execute_with_values(
    connection: &mut SqliteConnection,
    sql: &str,
    values: &[TargetValue],
) -> Result<u64> {
    let mut query = sqlx::query(sql);
    for value in values {
        query = bind_value(query, value);
    }

    let result = query
        .execute(connection)
        .await
        .map_err(|e| Error::execution(sql, e))?;

    Ok(result.rows_affected())
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q TargetValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        TargetValue::Null => query.bind(None::<i64>),
        TargetValue::Integer(n) => query.bind(*n),
        TargetValue::Real(x) => query.bind(*x),
        TargetValue::Text(s) => query.bind(s.as_str()),
        TargetValue::Blob(bytes) => query.bind(bytes.as_slice()),
    }
}

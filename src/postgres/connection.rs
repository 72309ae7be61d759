use std::fmt;

use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::error::SqlSessionError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::build_result_set_from_rows;

/// Owned Postgres client plus the task driving its wire connection.
pub struct PostgresConnection {
    client: Client,
    connection_task: JoinHandle<()>,
}

impl PostgresConnection {
    /// Connect using a libpq-style connection string (opaque to this crate;
    /// format dictated by tokio-postgres).
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` if the connection cannot be
    /// established.
    pub async fn open(conn_str: &str) -> Result<Self, SqlSessionError> {
        let (client, connection) = tokio_postgres::connect(conn_str, NoTls)
            .await
            .map_err(|e| {
                SqlSessionError::ConnectionError(format!("postgres connect failed: {e}"))
            })?;

        let connection_task = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "postgres connection task ended with error");
            }
        });

        Ok(Self {
            client,
            connection_task,
        })
    }

    /// Execute a statement batch verbatim.
    ///
    /// # Errors
    /// Returns `SqlSessionError` if any statement in the batch fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlSessionError> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Execute one statement with positional values and materialize the rows.
    ///
    /// # Errors
    /// Returns `SqlSessionError` if execution or result building fails.
    pub async fn execute_select(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlSessionError> {
        let converted = Params::convert(params);
        let rows = self.client.query(sql, converted.as_refs()).await?;
        build_result_set_from_rows(&rows)
    }

    /// Execute one DML statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns `SqlSessionError` if execution fails or the driver reports a
    /// count that does not fit `usize`.
    pub async fn execute_dml(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlSessionError> {
        let converted = Params::convert(params);
        let rows = self.client.execute(sql, converted.as_refs()).await?;
        usize::try_from(rows).map_err(|e| {
            SqlSessionError::ExecutionError(format!(
                "postgres affected rows conversion error: {e}"
            ))
        })
    }

    /// Drop the client and reap the connection task.
    pub async fn shutdown(self) {
        let Self {
            client,
            connection_task,
        } = self;
        drop(client);
        if let Err(e) = connection_task.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "postgres connection task join failed");
            }
        }
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection").finish_non_exhaustive()
    }
}

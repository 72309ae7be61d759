use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::SqlSessionError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::build_result_set;

pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Owned `SQLite` connection; every driver call runs on the blocking pool.
pub struct SqliteConnection {
    conn: SharedSqliteConnection,
}

impl SqliteConnection {
    /// Open a database at `path` (rusqlite's connection-string format, so
    /// `:memory:` and `file:` URIs work too).
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` if the database cannot be
    /// opened.
    pub async fn open(path: &str) -> Result<Self, SqlSessionError> {
        let path_owned = path.to_owned();
        let conn = tokio::task::spawn_blocking(move || rusqlite::Connection::open(path_owned))
            .await
            .map_err(|e| {
                SqlSessionError::ConnectionError(format!("sqlite open join error: {e}"))
            })?
            .map_err(|e| SqlSessionError::ConnectionError(format!("sqlite open failed: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn conn_handle(&self) -> SharedSqliteConnection {
        Arc::clone(&self.conn)
    }

    /// Run a closure against the raw rusqlite connection on the blocking pool.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlSessionError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlSessionError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(self.conn_handle(), func).await
    }

    /// Execute a statement batch verbatim (no parameters, no implicit
    /// transaction wrapping).
    ///
    /// # Errors
    /// Returns `SqlSessionError` if any statement in the batch fails.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlSessionError> {
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle(), move |conn| {
            conn.execute_batch(&sql_owned)
                .map_err(SqlSessionError::SqliteError)
        })
        .await
    }

    /// Execute one statement with positional values and materialize the rows.
    ///
    /// # Errors
    /// Returns `SqlSessionError` if preparation or execution fails.
    pub async fn execute_select(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlSessionError> {
        let sql_owned = sql.to_owned();
        let values = Params::convert(params);
        run_blocking(self.conn_handle(), move |conn| {
            let mut stmt = conn.prepare(&sql_owned)?;
            build_result_set(&mut stmt, values.as_values())
        })
        .await
    }

    /// Execute one DML statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns `SqlSessionError` if preparation or execution fails.
    pub async fn execute_dml(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlSessionError> {
        let sql_owned = sql.to_owned();
        let values = Params::convert(params);
        run_blocking(self.conn_handle(), move |conn| {
            let mut stmt = conn.prepare(&sql_owned)?;
            let refs = values.as_refs();
            stmt.execute(&refs[..]).map_err(SqlSessionError::SqliteError)
        })
        .await
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection").finish_non_exhaustive()
    }
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlSessionError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlSessionError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| {
        SqlSessionError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
    })?
}

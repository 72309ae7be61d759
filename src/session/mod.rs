mod exec;
mod tran;

use std::fmt;
use std::sync::Arc;

use crate::binding::PlaceholderStyle;
use crate::error::SqlSessionError;
use crate::params::{AmbientParamSource, ParamBag};
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;

pub use exec::SessionExecutor;

/// Default per-statement timeout, in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 30_000;

/// The one live backend connection a [`Session`] owns.
pub enum SessionConnection {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
}

impl SessionConnection {
    pub(crate) fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(_) => PlaceholderStyle::Sqlite,
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(_) => PlaceholderStyle::Postgres,
        }
    }

    pub(crate) fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(_) => DatabaseType::Postgres,
        }
    }

    pub(crate) async fn select(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(conn) => conn.execute_select(sql, params).await,
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(conn) => conn.execute_select(sql, params).await,
        }
    }

    pub(crate) async fn dml(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(conn) => conn.execute_dml(sql, params).await,
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(conn) => conn.execute_dml(sql, params).await,
        }
    }

    pub(crate) async fn batch(&self, sql: &str) -> Result<(), SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(conn) => conn.execute_batch(sql).await,
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(conn) => conn.execute_batch(sql).await,
        }
    }

    async fn shutdown(self) {
        match self {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(conn) => drop(conn),
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(conn) => conn.shutdown().await,
        }
    }
}

impl fmt::Debug for SessionConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(conn) => f.debug_tuple("Sqlite").field(conn).finish(),
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(conn) => f.debug_tuple("Postgres").field(conn).finish(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct SessionConfig {
    pub(crate) timeout_ms: u64,
    pub(crate) clear_parameters: bool,
    pub(crate) ambient: Option<Arc<dyn AmbientParamSource>>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            clear_parameters: true,
            ambient: None,
        }
    }
}

enum Target {
    #[cfg(feature = "sqlite")]
    Sqlite(String),
    #[cfg(feature = "postgres")]
    Postgres(String),
}

/// Builder for a [`Session`] and its options.
pub struct SessionBuilder {
    target: Target,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Per-statement timeout in milliseconds; `0` disables the deadline.
    #[must_use]
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Whether the merged parameter bag is discarded after reader-returning
    /// calls (`true`, the default) or retained for inspection via
    /// [`Session::last_bound_params`].
    #[must_use]
    pub fn clear_parameters(mut self, clear: bool) -> Self {
        self.config.clear_parameters = clear;
        self
    }

    /// Register an ambient parameter source whose values fill placeholder
    /// names the caller leaves unbound. Caller-supplied bindings always win.
    #[must_use]
    pub fn ambient_source(mut self, source: Arc<dyn AmbientParamSource>) -> Self {
        self.config.ambient = Some(source);
        self
    }

    /// Open the connection and return the live session.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` if the driver cannot open
    /// the connection.
    pub async fn connect(self) -> Result<Session, SqlSessionError> {
        let conn = match self.target {
            #[cfg(feature = "sqlite")]
            Target::Sqlite(path) => {
                SessionConnection::Sqlite(SqliteConnection::open(&path).await?)
            }
            #[cfg(feature = "postgres")]
            Target::Postgres(conn_str) => {
                SessionConnection::Postgres(PostgresConnection::open(&conn_str).await?)
            }
        };
        tracing::debug!(db_type = ?conn.database_type(), "session opened");
        Ok(Session {
            conn: Some(conn),
            config: self.config,
            in_transaction: false,
            last_bound: None,
        })
    }
}

/// One live database connection, an optional active transaction, and helper
/// methods that execute parameterized statements and shape their results.
///
/// A session owns its connection exclusively: every execution method takes
/// `&mut self`, so at most one statement is in flight at a time, and each
/// call awaits driver completion before returning. There is no pooling, no
/// caching, no retry, and no SQL generation here.
///
/// ```rust,no_run
/// use sql_session::prelude::*;
///
/// # async fn demo() -> Result<(), SqlSessionError> {
/// let mut session = Session::sqlite(":memory:").await?;
/// let updated = session
///     .execute_dml(
///         "UPDATE t SET x = 1 WHERE id = :id",
///         &ParamBag::new().set("id", RowValues::Int(5)),
///     )
///     .await?;
/// # let _ = updated;
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Session {
    conn: Option<SessionConnection>,
    config: SessionConfig,
    in_transaction: bool,
    last_bound: Option<ParamBag>,
}

impl Session {
    /// Builder for a `SQLite` session (`path`, `:memory:`, or a `file:` URI).
    #[cfg(feature = "sqlite")]
    pub fn sqlite_builder(path: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            target: Target::Sqlite(path.into()),
            config: SessionConfig::default(),
        }
    }

    /// Builder for a Postgres session (libpq-style connection string).
    #[cfg(feature = "postgres")]
    pub fn postgres_builder(conn_str: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            target: Target::Postgres(conn_str.into()),
            config: SessionConfig::default(),
        }
    }

    /// Open a `SQLite` session with default options.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` on open failure.
    #[cfg(feature = "sqlite")]
    pub async fn sqlite(path: impl Into<String>) -> Result<Self, SqlSessionError> {
        Self::sqlite_builder(path).connect().await
    }

    /// Open a Postgres session with default options.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` on open failure.
    #[cfg(feature = "postgres")]
    pub async fn postgres(conn_str: impl Into<String>) -> Result<Self, SqlSessionError> {
        Self::postgres_builder(conn_str).connect().await
    }

    /// Open a session for `db_type` with default options; the connection
    /// string is opaque to this crate and handed to the driver as-is.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` on open failure.
    pub async fn connect(
        db_type: DatabaseType,
        conn_str: impl Into<String>,
    ) -> Result<Self, SqlSessionError> {
        match db_type {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Self::sqlite(conn_str).await,
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => Self::postgres(conn_str).await,
        }
    }

    /// Backend type of the owned connection, or `None` after close.
    #[must_use]
    pub fn database_type(&self) -> Option<DatabaseType> {
        self.conn.as_ref().map(SessionConnection::database_type)
    }

    /// Whether a transaction is currently active.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// The parameter bag retained by the last reader-returning call, when the
    /// session was built with `clear_parameters(false)`.
    #[must_use]
    pub fn last_bound_params(&self) -> Option<&ParamBag> {
        self.last_bound.as_ref()
    }

    pub(crate) fn conn(&self) -> Result<&SessionConnection, SqlSessionError> {
        self.conn
            .as_ref()
            .ok_or_else(|| SqlSessionError::ConnectionError("session is closed".into()))
    }

    /// Merge ambient parameters under the caller's bag.
    pub(crate) fn effective_params(&self, params: &ParamBag) -> ParamBag {
        match &self.config.ambient {
            Some(source) => params.merged_over(&source.ambient_params()),
            None => params.clone(),
        }
    }

    /// Run a closure against the raw rusqlite connection, for driver
    /// features the session surface does not cover.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` after close, and
    /// `SqlSessionError::Unimplemented` on non-SQLite sessions; use backend
    /// SQL through the execution methods instead.
    #[cfg(feature = "sqlite")]
    pub async fn with_sqlite_connection<F, R>(&self, func: F) -> Result<R, SqlSessionError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlSessionError> + Send + 'static,
        R: Send + 'static,
    {
        match self.conn()? {
            SessionConnection::Sqlite(conn) => conn.with_connection(func).await,
            #[allow(unreachable_patterns)]
            _ => Err(SqlSessionError::Unimplemented(
                "raw connection access is only available for SQLite sessions".into(),
            )),
        }
    }

    /// Commit any still-open transaction and close the connection.
    ///
    /// An open transaction is **committed**, not rolled back. Never returns
    /// an error; failures
    /// during teardown are logged and suppressed. Safe to call repeatedly,
    /// and any later execution call fails with `ConnectionError`.
    pub async fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if self.in_transaction {
            if let Err(e) = conn.batch("COMMIT").await {
                tracing::warn!(error = %e, "commit during session close failed");
            }
            self.in_transaction = false;
        }
        self.last_bound = None;
        conn.shutdown().await;
        tracing::debug!("session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take()
            && let Ok(handle) = tokio::runtime::Handle::try_current()
        {
            let in_transaction = self.in_transaction;
            handle.spawn(async move {
                if in_transaction
                    && let Err(e) = conn.batch("COMMIT").await
                {
                    tracing::warn!(error = %e, "commit during session drop failed");
                }
                conn.shutdown().await;
            });
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("conn", &self.conn)
            .field("in_transaction", &self.in_transaction)
            .field("timeout_ms", &self.config.timeout_ms)
            .field("clear_parameters", &self.config.clear_parameters)
            .finish_non_exhaustive()
    }
}

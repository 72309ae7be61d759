use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;
#[cfg(feature = "postgres")]
use tokio_postgres;

/// Errors surfaced by a [`Session`](crate::session::Session).
///
/// Driver failures (malformed SQL, parameter mismatch, execution errors) are
/// propagated transparently; nothing is caught or retried inside the crate.
#[derive(Debug, Error)]
pub enum SqlSessionError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter binding error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Statement timed out after {0} ms")]
    Timeout(u64),

    #[error("Query returned {0} rows where exactly one was required")]
    Cardinality(usize),

    #[error("Transaction state error: {0}")]
    TransactionState(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

use crate::error::SqlSessionError;
use crate::types::IsolationLevel;

use super::exec::with_timeout;
use super::{Session, SessionConnection};

impl Session {
    /// Begin a transaction on the owned connection at the driver's default
    /// isolation level.
    ///
    /// A second `begin_tran` while one is active is rejected: the session
    /// holds at most one transaction, and silently dropping a live one is
    /// not an option.
    ///
    /// # Errors
    /// Returns `SqlSessionError::TransactionState` if a transaction is
    /// already active, or the driver error if `BEGIN` fails.
    pub async fn begin_tran(&mut self) -> Result<(), SqlSessionError> {
        self.begin_with_statement(|conn| match conn {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(_) => "BEGIN",
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(_) => "BEGIN",
        })
        .await
    }

    /// Begin a transaction at the requested isolation level.
    ///
    /// # Errors
    /// Returns `SqlSessionError::TransactionState` if a transaction is
    /// already active, or the driver error if `BEGIN` fails.
    pub async fn begin_tran_with(
        &mut self,
        isolation: IsolationLevel,
    ) -> Result<(), SqlSessionError> {
        self.begin_with_statement(move |conn| match conn {
            #[cfg(feature = "sqlite")]
            SessionConnection::Sqlite(_) => isolation.sqlite_sql(),
            #[cfg(feature = "postgres")]
            SessionConnection::Postgres(_) => isolation.postgres_sql(),
        })
        .await
    }

    async fn begin_with_statement<F>(&mut self, statement: F) -> Result<(), SqlSessionError>
    where
        F: FnOnce(&SessionConnection) -> &'static str,
    {
        if self.in_transaction {
            return Err(SqlSessionError::TransactionState(
                "transaction already in progress; nested begin_tran is not supported".into(),
            ));
        }
        let timeout_ms = self.config.timeout_ms;
        let conn = self.conn()?;
        let sql = statement(conn);
        with_timeout(timeout_ms, conn.batch(sql)).await?;
        self.in_transaction = true;
        Ok(())
    }

    /// Commit the active transaction. A no-op when none is active, so
    /// repeated calls are safe.
    ///
    /// # Errors
    /// Returns the driver error if `COMMIT` fails; the transaction is then
    /// still considered active.
    pub async fn commit_tran(&mut self) -> Result<(), SqlSessionError> {
        if !self.in_transaction {
            return Ok(());
        }
        let timeout_ms = self.config.timeout_ms;
        let conn = self.conn()?;
        with_timeout(timeout_ms, conn.batch("COMMIT")).await?;
        self.in_transaction = false;
        Ok(())
    }

    /// Roll back the active transaction. A no-op when none is active, so
    /// repeated calls are safe.
    ///
    /// # Errors
    /// Returns the driver error if `ROLLBACK` fails; the transaction is then
    /// still considered active.
    pub async fn rollback_tran(&mut self) -> Result<(), SqlSessionError> {
        if !self.in_transaction {
            return Ok(());
        }
        let timeout_ms = self.config.timeout_ms;
        let conn = self.conn()?;
        with_timeout(timeout_ms, conn.batch("ROLLBACK")).await?;
        self.in_transaction = false;
        Ok(())
    }
}

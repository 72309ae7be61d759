use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::binding::bind_named;
use crate::error::SqlSessionError;
use crate::mapping::FromRow;
use crate::params::ParamBag;
use crate::results::{DataSet, ResultSet, RowCursor};
use crate::types::RowValues;

use super::Session;

pub(crate) async fn with_timeout<T>(
    timeout_ms: u64,
    fut: impl Future<Output = Result<T, SqlSessionError>>,
) -> Result<T, SqlSessionError> {
    if timeout_ms == 0 {
        return fut.await;
    }
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(SqlSessionError::Timeout(timeout_ms)),
    }
}

impl Session {
    /// Run a statement and return the first column of the first row.
    ///
    /// An empty result set, or a SQL NULL in that position, normalizes to
    /// `RowValues::Int(0)`: scalar calls never yield a null marker.
    ///
    /// # Errors
    /// Returns binding, timeout, or driver errors.
    pub async fn execute_scalar(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<RowValues, SqlSessionError> {
        let set = self.run_select(sql, params).await?;
        self.last_bound = None;
        let scalar = set
            .results
            .first()
            .and_then(|row| row.get_by_index(0))
            .cloned()
            .unwrap_or(RowValues::Null);
        Ok(match scalar {
            RowValues::Null => RowValues::Int(0),
            other => other,
        })
    }

    /// Scalar converted to `i64`.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ExecutionError` when the value cannot be
    /// represented as an integer, plus any [`execute_scalar`](Self::execute_scalar) error.
    pub async fn scalar_i64(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<i64, SqlSessionError> {
        match self.execute_scalar(sql, params).await? {
            RowValues::Int(i) => Ok(i),
            RowValues::Float(f) => Ok(f as i64),
            RowValues::Bool(b) => Ok(i64::from(b)),
            RowValues::Text(s) => s.trim().parse::<i64>().map_err(|e| {
                SqlSessionError::ExecutionError(format!("scalar {s:?} is not an integer: {e}"))
            }),
            other => Err(SqlSessionError::ExecutionError(format!(
                "scalar {other:?} is not an integer"
            ))),
        }
    }

    /// Scalar converted to `f64`.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ExecutionError` when the value cannot be
    /// represented as a float, plus any [`execute_scalar`](Self::execute_scalar) error.
    pub async fn scalar_f64(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<f64, SqlSessionError> {
        match self.execute_scalar(sql, params).await? {
            RowValues::Float(f) => Ok(f),
            RowValues::Int(i) => Ok(i as f64),
            RowValues::Text(s) => s.trim().parse::<f64>().map_err(|e| {
                SqlSessionError::ExecutionError(format!("scalar {s:?} is not a float: {e}"))
            }),
            other => Err(SqlSessionError::ExecutionError(format!(
                "scalar {other:?} is not a float"
            ))),
        }
    }

    /// Scalar rendered as text. An empty result
    /// renders as `"0"`, following the scalar normalization.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ExecutionError` for binary values, plus any
    /// [`execute_scalar`](Self::execute_scalar) error.
    pub async fn scalar_string(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<String, SqlSessionError> {
        match self.execute_scalar(sql, params).await? {
            RowValues::Text(s) => Ok(s),
            RowValues::Int(i) => Ok(i.to_string()),
            RowValues::Float(f) => Ok(f.to_string()),
            RowValues::Bool(b) => Ok(b.to_string()),
            RowValues::Timestamp(dt) => Ok(dt.format("%F %T%.f").to_string()),
            RowValues::JSON(j) => Ok(j.to_string()),
            other => Err(SqlSessionError::ExecutionError(format!(
                "scalar {other:?} has no text rendering"
            ))),
        }
    }

    /// Scalar converted to a timestamp.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ExecutionError` when the value is not a
    /// timestamp, plus any [`execute_scalar`](Self::execute_scalar) error.
    pub async fn scalar_timestamp(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<NaiveDateTime, SqlSessionError> {
        let value = self.execute_scalar(sql, params).await?;
        value.as_timestamp().ok_or_else(|| {
            SqlSessionError::ExecutionError(format!("scalar {value:?} is not a timestamp"))
        })
    }

    /// Run a DML statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns binding, timeout, or driver errors.
    pub async fn execute_dml(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<usize, SqlSessionError> {
        let merged = self.effective_params(params);
        let timeout_ms = self.config.timeout_ms;
        let conn = self.conn()?;
        let bound = bind_named(sql, &merged, conn.placeholder_style())?;
        let count = with_timeout(timeout_ms, conn.dml(&bound.sql, &bound.params)).await?;
        self.last_bound = None;
        Ok(count)
    }

    /// Run a query and hand back a forward-only [`RowCursor`] the caller
    /// owns. Rows are buffered before the cursor is returned, so the cursor
    /// may outlive further commands on this session; dropping it closes it.
    ///
    /// With `clear_parameters(false)` the merged bag is retained on the
    /// session afterwards ([`last_bound_params`](Self::last_bound_params)).
    ///
    /// # Errors
    /// Returns binding, timeout, or driver errors.
    pub async fn execute_reader(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<RowCursor, SqlSessionError> {
        let merged = self.effective_params(params);
        let timeout_ms = self.config.timeout_ms;
        let conn = self.conn()?;
        let bound = bind_named(sql, &merged, conn.placeholder_style())?;
        let set = with_timeout(timeout_ms, conn.select(&bound.sql, &bound.params)).await?;
        self.last_bound = if self.config.clear_parameters {
            None
        } else {
            Some(merged)
        };
        Ok(RowCursor::from_result_set(set))
    }

    /// Run a query and materialize the whole result as a table.
    ///
    /// # Errors
    /// Returns binding, timeout, or driver errors.
    pub async fn execute_select(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<ResultSet, SqlSessionError> {
        let set = self.run_select(sql, params).await?;
        self.last_bound = None;
        Ok(set)
    }

    /// Run multi-statement SQL text and collect one [`ResultSet`] per
    /// statement. Statements are split at
    /// top-level `;` boundaries; each binds against the same parameter bag,
    /// taking only the names it references. Fully materialized, in order.
    ///
    /// # Errors
    /// Returns binding, timeout, or driver errors from any statement;
    /// execution stops at the first failure.
    pub async fn execute_dataset(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<DataSet, SqlSessionError> {
        let merged = self.effective_params(params);
        let timeout_ms = self.config.timeout_ms;
        let conn = self.conn()?;
        let style = conn.placeholder_style();
        let mut data_set = DataSet::new();
        for statement in crate::binding::split_statements(sql) {
            let bound = bind_named(&statement, &merged, style)?;
            let set = with_timeout(timeout_ms, conn.select(&bound.sql, &bound.params)).await?;
            data_set.push(set);
        }
        self.last_bound = None;
        Ok(data_set)
    }

    /// Run an unparameterized statement batch verbatim (DDL, fixtures).
    ///
    /// # Errors
    /// Returns timeout or driver errors.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlSessionError> {
        let timeout_ms = self.config.timeout_ms;
        let conn = self.conn()?;
        with_timeout(timeout_ms, conn.batch(sql)).await
    }

    /// Run a query and map every row through `T`'s [`FromRow`] binding.
    ///
    /// # Errors
    /// Returns binding, timeout, driver, or row-mapping errors.
    pub async fn query_list<T: FromRow>(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<Vec<T>, SqlSessionError> {
        let set = self.execute_select(sql, params).await?;
        set.results.iter().map(T::from_row).collect()
    }

    /// Run a query expected to yield exactly one row and map it.
    ///
    /// # Errors
    /// Returns `SqlSessionError::Cardinality` when the query yields zero or
    /// more than one row, plus any [`query_list`](Self::query_list) error.
    pub async fn query_single<T: FromRow>(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<T, SqlSessionError> {
        let set = self.execute_select(sql, params).await?;
        if set.results.len() != 1 {
            return Err(SqlSessionError::Cardinality(set.results.len()));
        }
        T::from_row(&set.results[0])
    }

    async fn run_select(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<ResultSet, SqlSessionError> {
        let merged = self.effective_params(params);
        let timeout_ms = self.config.timeout_ms;
        let conn = self.conn()?;
        let bound = bind_named(sql, &merged, conn.placeholder_style())?;
        with_timeout(timeout_ms, conn.select(&bound.sql, &bound.params)).await
    }
}

/// Execution surface shared by anything that can run statements for generic
/// code, mirroring the session's core operations.
#[async_trait]
pub trait SessionExecutor {
    /// Run an unparameterized statement batch.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlSessionError>;

    /// Run a single SELECT statement and materialize the result set.
    async fn execute_select(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<ResultSet, SqlSessionError>;

    /// Run a single DML statement and return the affected-row count.
    async fn execute_dml(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<usize, SqlSessionError>;
}

#[async_trait]
impl SessionExecutor for Session {
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlSessionError> {
        Session::execute_batch(self, sql).await
    }

    async fn execute_select(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<ResultSet, SqlSessionError> {
        Session::execute_select(self, sql, params).await
    }

    async fn execute_dml(
        &mut self,
        sql: &str,
        params: &ParamBag,
    ) -> Result<usize, SqlSessionError> {
        Session::execute_dml(self, sql, params).await
    }
}

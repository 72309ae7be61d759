use rusqlite::types::Value;
use rusqlite::{Statement, ToSql};

use crate::error::SqlSessionError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlSessionError` if the value cannot be converted.
pub fn sqlite_extract_value(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlSessionError> {
    let value: Value = row.get(idx).map_err(SqlSessionError::SqliteError)?;
    match value {
        Value::Null => Ok(RowValues::Null),
        Value::Integer(i) => Ok(RowValues::Int(i)),
        Value::Real(f) => Ok(RowValues::Float(f)),
        Value::Text(s) => Ok(RowValues::Text(s)),
        Value::Blob(b) => Ok(RowValues::Blob(b)),
    }
}

/// Run a prepared statement and materialize every row it yields.
///
/// # Errors
/// Returns `SqlSessionError` if query execution or result processing fails.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[Value],
) -> Result<ResultSet, SqlSessionError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut rows_iter = stmt.query(&param_refs[..])?;
    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(std::sync::Arc::new(column_names));

    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);

        for i in 0..col_count {
            let value = sqlite_extract_value(row, i)?;
            row_values.push(value);
        }

        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

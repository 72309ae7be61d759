use crate::error::SqlSessionError;
use crate::results::Row;

/// Maps a result row onto a caller-defined type, binding columns to fields
/// by name through [`Row::get`].
///
/// ```rust
/// use sql_session::prelude::*;
///
/// struct Player {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for Player {
///     fn from_row(row: &Row) -> Result<Self, SqlSessionError> {
///         Ok(Player {
///             id: *row.get("id").and_then(RowValues::as_int).ok_or_else(|| {
///                 SqlSessionError::ExecutionError("player.id missing".into())
///             })?,
///             name: row
///                 .get("name")
///                 .and_then(RowValues::as_text)
///                 .ok_or_else(|| {
///                     SqlSessionError::ExecutionError("player.name missing".into())
///                 })?
///                 .to_string(),
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Build an instance from one row.
    ///
    /// # Errors
    /// Returns `SqlSessionError` when a required column is absent or has an
    /// incompatible type.
    fn from_row(row: &Row) -> Result<Self, SqlSessionError>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> Result<Self, SqlSessionError> {
        Ok(row.clone())
    }
}

use crate::types::RowValues;

/// Convert a single session value to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> rusqlite::types::Value {
    match value {
        RowValues::Int(i) => rusqlite::types::Value::Integer(*i),
        RowValues::Float(f) => rusqlite::types::Value::Real(*f),
        RowValues::Text(s) => rusqlite::types::Value::Text(s.clone()),
        RowValues::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => {
            let formatted = dt.format("%F %T%.f").to_string();
            rusqlite::types::Value::Text(formatted)
        }
        RowValues::Null => rusqlite::types::Value::Null,
        RowValues::JSON(jval) => rusqlite::types::Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => rusqlite::types::Value::Blob(bytes.clone()),
    }
}

/// Unified `SQLite` parameter container.
pub struct Params(pub Vec<rusqlite::types::Value>);

impl Params {
    /// Convert session row values into `SQLite` values.
    #[must_use]
    pub fn convert(params: &[RowValues]) -> Self {
        let mut vec_values = Vec::with_capacity(params.len());
        for p in params {
            vec_values.push(row_value_to_sqlite_value(p));
        }
        Params(vec_values)
    }

    /// Borrow the underlying values.
    #[must_use]
    pub fn as_values(&self) -> &[rusqlite::types::Value] {
        &self.0
    }

    /// Build a borrowed params slice suitable for rusqlite execution.
    #[must_use]
    pub fn as_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.0.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
    }
}

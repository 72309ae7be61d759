use std::collections::HashMap;
use std::sync::Arc;

use super::row::Row;
use crate::types::RowValues;

/// A fully materialized result set from a database query.
///
/// Rows are loaded eagerly before the set is returned; for DML statements
/// `rows_affected` carries the affected-row count instead.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<Row>,
    /// The number of rows returned, or affected for DML statements
    pub rows_affected: usize,
    /// Column names shared by all rows (to avoid duplicating in each row)
    column_names: Option<Arc<Vec<String>>>,
    column_index_cache: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
            column_index_cache: None,
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        let cache = Arc::new(
            column_names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        self.column_names = Some(column_names);
        self.column_index_cache = Some(cache);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set; column names must be set first.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let (Some(column_names), Some(cache)) = (&self.column_names, &self.column_index_cache) {
            self.results.push(Row::with_cache(
                column_names.clone(),
                cache.clone(),
                row_values,
            ));
            self.rows_affected += 1;
        }
    }

    /// Add a pre-built row, adopting its column names if none are set yet.
    pub fn add_row(&mut self, row: Row) {
        if self.column_names.is_none() {
            self.column_names = Some(row.column_names.clone());
            self.column_index_cache = Some(row.column_index_cache.clone());
        }

        self.results.push(row);
        self.rows_affected += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_column_names_and_resolve_by_name() {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_column_names(Arc::new(vec!["id".to_string(), "name".to_string()]));
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Text("b".into())]);

        assert_eq!(rs.rows_affected, 2);
        assert_eq!(rs.results[1].get("name"), Some(&RowValues::Text("b".into())));
        assert_eq!(rs.results[0].get_by_index(0), Some(&RowValues::Int(1)));
        assert!(Arc::ptr_eq(
            &rs.results[0].column_names,
            &rs.results[1].column_names
        ));
    }
}

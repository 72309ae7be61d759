use std::sync::Arc;

use super::result_set::ResultSet;
use super::row::Row;

/// Forward-only cursor over a query's rows, owned by the caller.
///
/// Rows are buffered eagerly when the cursor is produced, so holding a cursor
/// open does not occupy the session's connection and further commands may be
/// issued while it is alive. Dropping the cursor closes it; rows already
/// consumed cannot be revisited.
#[derive(Debug)]
pub struct RowCursor {
    column_names: Arc<Vec<String>>,
    rows: std::vec::IntoIter<Row>,
}

impl RowCursor {
    pub(crate) fn from_result_set(set: ResultSet) -> Self {
        let column_names = set
            .get_column_names()
            .cloned()
            .unwrap_or_else(|| Arc::new(Vec::new()));
        Self {
            column_names,
            rows: set.results.into_iter(),
        }
    }

    /// Column names of the underlying result.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Advance to the next row, or `None` once the cursor is exhausted.
    pub fn next_row(&mut self) -> Option<Row> {
        self.rows.next()
    }

    /// Rows not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for RowCursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.next_row()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

// Result shapes returned by session execution: materialized rows, tables,
// forward-only cursors, and multi-statement datasets.

mod cursor;
mod data_set;
mod result_set;
mod row;

pub use cursor::RowCursor;
pub use data_set::DataSet;
pub use result_set::ResultSet;
pub use row::Row;

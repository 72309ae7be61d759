//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::binding::{BoundStatement, PlaceholderStyle, bind_named, split_statements};
pub use crate::error::SqlSessionError;
pub use crate::mapping::FromRow;
pub use crate::params::{AmbientParamSource, ParamBag};
pub use crate::results::{DataSet, ResultSet, Row, RowCursor};
pub use crate::session::{
    DEFAULT_COMMAND_TIMEOUT_MS, Session, SessionBuilder, SessionConnection, SessionExecutor,
};
pub use crate::types::{DatabaseType, IsolationLevel, RowValues};

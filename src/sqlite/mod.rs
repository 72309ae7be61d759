// SQLite backend - rusqlite behind spawn_blocking
//
// This module is split into several sub-modules:
// - connection: owned connection handle and blocking dispatch
// - params: parameter conversion between session and SQLite types
// - query: result extraction and building

pub mod connection;
pub mod params;
pub mod query;

pub use connection::SqliteConnection;
pub use params::Params;
pub use query::build_result_set;

// Postgres backend - tokio-postgres client with a spawned connection task
//
// - connection: owned client handle and lifecycle
// - params: parameter conversion between session and Postgres types
// - query: result extraction and building

pub mod connection;
pub mod params;
pub mod query;

pub use connection::PostgresConnection;
pub use params::Params;
pub use query::build_result_set_from_rows;

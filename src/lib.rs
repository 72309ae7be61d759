//! Lightweight async session wrapper for rusqlite and tokio-postgres.
//!
//! A [`Session`] owns one live database connection and at most one active
//! transaction, and exposes convenience methods that run a parameterized SQL
//! statement and shape the result: a scalar, an affected-row count, a
//! forward-only cursor, a mapped object list, or a fully materialized
//! tabular structure. Every method is a direct pass-through to the driver:
//! no query builder, no SQL generation, no caching, no retry, no pooling.
//!
//! Statements use named `:name` placeholders bound from a [`ParamBag`];
//! binding rewrites them to the backend's positional style.
//!
//! [`ParamBag`]: params::ParamBag

pub mod binding;
pub mod error;
pub mod mapping;
pub mod params;
pub mod prelude;
pub mod results;
pub mod session;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::SqlSessionError;
pub use session::{Session, SessionBuilder, SessionExecutor};

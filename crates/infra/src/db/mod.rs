//! Postgres connection pool and schema bootstrap.

pub mod pool;
pub mod schema;

pub use pool::connect;
pub use schema::ensure_schema;

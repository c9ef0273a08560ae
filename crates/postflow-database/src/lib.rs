//! # postflow-database
//!
//! PostgreSQL connection pool, migrations, and repositories for
//! scheduled posts and their owners.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;

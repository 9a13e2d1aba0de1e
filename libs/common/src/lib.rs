//! Common library for the Conduit blogging backend
//!
//! This crate owns the persistence adapter shared by every service: database
//! configuration, connection pooling, schema migration and isolated test
//! handles, together with their error types.

pub mod database;
pub mod error;
pub mod schema;

pub use database::{Backend, Database, DatabaseConfig, RetryPolicy};
pub use error::{DatabaseError, DatabaseResult};

/// Example usage of the database module
///
/// ```rust,no_run
/// use conduit_common::database::{Database, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let database = Database::open(&config).await?;
///     database.migrate().await?;
///     println!("Database health check: {}", database.health_check().await?);
///     database.close().await;
///     Ok(())
/// }
/// ```
pub fn example_usage() {}

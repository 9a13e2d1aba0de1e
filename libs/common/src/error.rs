//! Custom error types for the common library
//!
//! This module defines the errors raised while configuring, connecting to and
//! migrating the relational store.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// A required configuration key was absent
    #[error("Missing database configuration key: {0}")]
    ConfigMissing(&'static str),

    /// A configuration value was present but unusable
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// Every connection attempt allowed by the retry policy failed
    #[error("Database connection failed after {attempts} attempt(s): {source}")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: SqlxError,
    },

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while applying the schema
    #[error("Database migration error: {0}")]
    MigrationFailed(#[source] SqlxError),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

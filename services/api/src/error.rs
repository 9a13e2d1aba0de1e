//! Custom error types for the stores

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the user and article stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// Caller-supplied aggregate is malformed or violates a precondition
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No row matched
    #[error("Record not found")]
    NotFound,

    /// Unique-constraint violation
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Referenced row does not exist
    #[error("Referenced record does not exist: {0}")]
    ForeignKey(String),

    /// Unclassified storage failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether the failure stems from the request rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(self, StoreError::Database(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &error {
            if db.is_unique_violation() {
                return StoreError::Duplicate(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                return StoreError::ForeignKey(db.message().to_string());
            }
        }
        if matches!(error, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }
        StoreError::Database(error)
    }
}

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures while loading initial users
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Seed file not found: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("Failed to parse seed file: {0}")]
    ParseFailed(String),

    /// The whole seed was rolled back because of this user
    #[error("Failed to insert seed user {username}: {source}")]
    InsertFailed {
        username: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

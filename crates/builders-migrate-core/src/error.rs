//! Core error types.

use crate::migration::MigrationError;
use thiserror::Error;

/// Errors that abort a check-and-migrate run.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Could not open or close the database connection.
    #[error("connection error")]
    Connection(#[source] sqlx::Error),

    /// A read or schema query failed.
    #[error("{operation} failed")]
    Query {
        /// What was being queried.
        operation: &'static str,
        /// Underlying database error.
        #[source]
        source: sqlx::Error,
    },

    /// Applying the migration plan failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MigrateError {
    pub(crate) fn query(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| MigrateError::Query { operation, source }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

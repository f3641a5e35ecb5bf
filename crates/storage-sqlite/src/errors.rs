//! Storage error types and conversions into core errors.

use crisiscleanup_core::errors::{DatabaseError, Error};
use thiserror::Error;

/// Errors raised inside the storage layer before conversion to core errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error(transparent)]
    Domain(#[from] Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Domain(inner) => inner,
            StorageError::Query(inner) => {
                Error::Database(DatabaseError::QueryFailed(inner.to_string()))
            }
            StorageError::Pool(inner) => {
                Error::Database(DatabaseError::ConnectionFailed(inner.to_string()))
            }
            StorageError::Connection(inner) => {
                Error::Database(DatabaseError::ConnectionFailed(inner.to_string()))
            }
            StorageError::Migration(inner) => {
                Error::Database(DatabaseError::MigrationFailed(inner))
            }
        }
    }
}

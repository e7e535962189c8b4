//! Storage-specific error type wrapping sqlx errors.

use twilight_domain::error::TwilightError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored date could not be parsed back.
    #[error("invalid date {value:?} stored for {selector}")]
    InvalidDate {
        selector: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl From<StorageError> for TwilightError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

//! Error types module
//!
//! `AppError` is the error returned by repositories. Callers at the application
//! edge convert it into `anyhow::Error` and attach context.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Not found: {0}")]
    NotFound(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

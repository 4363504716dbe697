//! MySQL-specific database implementations
//!
//! This module contains MySQL implementations of repository traits
//! using SQLx for database operations.

pub mod token_repository_impl;
pub mod user_repository_impl;

// Re-export the MySQL implementations
pub use token_repository_impl::MySqlTokenRepository;
pub use user_repository_impl::MySqlUserRepository;

use authn_core::errors::DomainError;

/// Maps a driver error to a storage failure, logging the detail
pub(crate) fn storage_error(context: &str, error: sqlx::Error) -> DomainError {
    tracing::error!(error = %error, "{}", context);
    DomainError::storage(format!("{}: {}", context, error))
}

/// Maps a row decoding error
pub(crate) fn column_error(column: &str, error: sqlx::Error) -> DomainError {
    DomainError::Internal {
        message: format!("Failed to get {}: {}", column, error),
    }
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Converts an AUTO_INCREMENT id to the domain id type
pub(crate) fn to_id(raw: u64) -> Result<i64, DomainError> {
    i64::try_from(raw).map_err(|_| DomainError::Internal {
        message: format!("Generated id {} out of range", raw),
    })
}

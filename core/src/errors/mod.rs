//! Domain-specific error types and error handling.

mod types;


pub use types::{AuthError, TokenError, ValidationError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Transient storage failure or timeout; never retried inside the engine
    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    ValidationErr(#[from] ValidationError),
}

impl DomainError {
    /// Shorthand for a storage failure with context
    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Whether this error is a rejection of a refresh token
    pub fn is_refresh_rejection(&self) -> bool {
        matches!(
            self,
            DomainError::Token(TokenError::InvalidRefreshToken)
                | DomainError::Token(TokenError::RefreshTokenExpired)
        )
    }

    /// Whether this error is a rejection of an access token
    pub fn is_access_rejection(&self) -> bool {
        matches!(
            self,
            DomainError::Token(TokenError::InvalidSignature)
                | DomainError::Token(TokenError::TokenExpired)
                | DomainError::Token(TokenError::InvalidTokenFormat)
        )
    }

    /// Whether the caller may retry after a short delay
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::StorageUnavailable { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

//! Error type definitions for authentication, token management, and validation
//!
//! The messages here are for logs. The presentation layer decides what a
//! client sees, and collapses token failures into a single generic rejection.

use thiserror::Error;

/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("User not found")]
    UserNotFound,
}

/// Token-related errors
#[derive(Error, Debug)]
pub enum TokenError {
    /// Access token past its `exp`
    #[error("Token expired")]
    TokenExpired,

    /// Access token that cannot be parsed or lacks required claims
    #[error("Invalid token format")]
    InvalidTokenFormat,

    /// Bad HMAC or an algorithm other than HS256
    #[error("Invalid signature")]
    InvalidSignature,

    /// Unknown, reused, or superseded refresh token
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Refresh token past its expiry, with no compromise signal
    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Token generation failed")]
    TokenGenerationFailed,

    #[error("Secure randomness unavailable")]
    RandomnessUnavailable,
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid length: {field} (min: {min}, max: {max})")]
    InvalidLength { field: String, min: usize, max: usize },
}

//! # AuthN Core
//!
//! Core business logic and domain layer for the AuthN backend.
//! This crate contains the domain entities, the refresh session lifecycle
//! engine, repository interfaces with in-memory implementations, and the
//! error types shared by the infrastructure and API layers.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{Claims, NewRefreshToken, RefreshToken, RefreshTokenState, TokenPair, User};
pub use errors::{AuthError, DomainError, DomainResult, TokenError, ValidationError};
pub use repositories::{
    InMemoryTokenRepository, InMemoryUserRepository, Rotation, TokenRepository, UserRepository,
};
pub use services::{
    AuthService, AuthServiceConfig, ClaimsSigner, OpaqueTokenGenerator, TokenCleanupConfig,
    TokenCleanupService, TokenService, TokenServiceConfig,
};

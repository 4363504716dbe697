//! Token service module for access and refresh token management
//!
//! This module handles all token-related operations including:
//! - HS256 access token signing and verification
//! - Opaque refresh token generation and hashing
//! - Refresh token rotation with reuse detection
//! - Revocation and background cleanup of expired tokens

mod cleanup;
mod config;
mod generator;
mod service;
mod signer;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, TokenCleanupConfig, TokenCleanupService};
pub use config::TokenServiceConfig;
pub use generator::{hash_token, OpaqueToken, OpaqueTokenGenerator, REFRESH_TOKEN_BYTES};
pub use service::TokenService;
pub(crate) use service::with_deadline;
pub use signer::ClaimsSigner;

//! Opaque refresh token generation

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::errors::{DomainError, TokenError};

/// Number of random bytes in a refresh secret (hex-encoded to 64 chars)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// A raw refresh secret and the digest that gets stored in its place
pub struct OpaqueToken {
    /// Handed to the client exactly once
    pub raw: String,
    /// SHA-256 of `raw`, hex-encoded
    pub digest: String,
}

impl std::fmt::Debug for OpaqueToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpaqueToken")
            .field("raw", &"[REDACTED]")
            .field("digest", &self.digest)
            .finish()
    }
}

/// Produces refresh secrets from the operating system's CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueTokenGenerator;

impl OpaqueTokenGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates a fresh secret and its digest
    ///
    /// A failing random source is reported, never papered over.
    pub fn generate(&self) -> Result<OpaqueToken, DomainError> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            tracing::error!(error = %e, "Secure random source unavailable");
            DomainError::Token(TokenError::RandomnessUnavailable)
        })?;

        let raw = hex::encode(bytes);
        let digest = hash_token(&raw);
        Ok(OpaqueToken { raw, digest })
    }
}

/// Hashes a refresh secret for storage and lookup
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

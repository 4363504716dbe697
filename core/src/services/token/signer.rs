//! HS256 claims signer for access tokens
//!
//! The secret is injected once at construction and never leaves this type.
//! Verification accepts exactly one algorithm so a token cannot choose how
//! it gets checked.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::domain::entities::token::Claims;
use crate::errors::{DomainError, TokenError};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signs and verifies access token claims with a symmetric secret
#[derive(Clone)]
pub struct ClaimsSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl ClaimsSigner {
    /// Creates a signer for `secret`; an empty secret is rejected
    pub fn new(secret: &str) -> Result<Self, DomainError> {
        if secret.is_empty() {
            return Err(DomainError::Internal {
                message: "JWT secret must not be empty".to_string(),
            });
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Encodes claims into a JWT
    pub fn sign(&self, claims: &Claims) -> Result<String, DomainError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign access token");
            DomainError::Token(TokenError::TokenGenerationFailed)
        })
    }

    /// Builds and signs claims for a user, valid for `ttl_seconds`
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        ttl_seconds: i64,
    ) -> Result<String, DomainError> {
        self.sign(&Claims::new(user_id, username, ttl_seconds))
    }

    /// Verifies a token and returns its claims
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Signature valid, algorithm HS256, not expired
    /// * `Err(TokenError::InvalidSignature)` - Bad HMAC or another algorithm
    /// * `Err(TokenError::TokenExpired)` - Past `exp`
    /// * `Err(TokenError::InvalidTokenFormat)` - Malformed or missing claims
    pub fn verify(&self, token: &str) -> Result<Claims, DomainError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            let error = match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
                _ => TokenError::InvalidTokenFormat,
            };
            DomainError::Token(error)
        })?;

        // The subject has to be a usable user id
        data.claims
            .user_id()
            .map_err(|_| DomainError::Token(TokenError::InvalidTokenFormat))?;

        Ok(data.claims)
    }
}

impl std::fmt::Debug for ClaimsSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsSigner")
            .field("algorithm", &ALGORITHM)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

//! Configuration for the token service

use std::time::Duration;

use authn_shared::AuthConfig;

use crate::domain::entities::token::{
    DEFAULT_ACCESS_TOKEN_TTL_SECONDS, DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
};

/// Configuration for the token service
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// HS256 signing secret, loaded once at startup
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_seconds: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_seconds: i64,
    /// Upper bound on every session store call
    pub store_timeout: Duration,
    /// Maximum hops followed when walking a rotation chain
    pub max_chain_length: usize,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            store_timeout: Duration::from_secs(3),
            max_chain_length: 64,
        }
    }
}

impl TokenServiceConfig {
    /// Builds the token service config from the shared auth config
    pub fn from_auth_config(auth: &AuthConfig) -> Self {
        Self {
            jwt_secret: auth.jwt_secret().to_string(),
            access_token_ttl_seconds: auth.access_token_expiry_seconds(),
            refresh_token_ttl_seconds: auth.refresh_token_expiry_seconds(),
            store_timeout: Duration::from_secs(auth.session.store_timeout),
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("store_timeout", &self.store_timeout)
            .field("max_chain_length", &self.max_chain_length)
            .finish()
    }
}

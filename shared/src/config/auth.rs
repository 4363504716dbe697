//! Authentication configuration

use serde::{Deserialize, Serialize};

const DEFAULT_SECRET: &str = "super_secret_change_me";

/// Longest accepted token lifetime (10 years), in seconds
pub const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 3600;

/// JWT access token configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// HMAC secret for signing access tokens
    pub secret: String,

    /// Access token lifetime in seconds
    pub access_token_expiry: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            access_token_expiry: 900, // 15 minutes
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = bound_ttl(minutes.saturating_mul(60));
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

/// Refresh session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,

    /// Upper bound for a single store operation, in seconds
    #[serde(default = "default_store_timeout")]
    pub store_timeout: u64,

    /// bcrypt work factor for password hashes
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// How often expired refresh tokens are purged, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,

    /// Whether the background purge runs at all
    #[serde(default = "default_cleanup_enabled")]
    pub cleanup_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_token_expiry: 86400, // 24 hours
            store_timeout: default_store_timeout(),
            bcrypt_cost: default_bcrypt_cost(),
            cleanup_interval: default_cleanup_interval(),
            cleanup_enabled: default_cleanup_enabled(),
        }
    }
}

impl SessionConfig {
    /// Set refresh token expiry in hours
    pub fn with_refresh_expiry_hours(mut self, hours: i64) -> Self {
        self.refresh_token_expiry = bound_ttl(hours.saturating_mul(3600));
        self
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = SessionConfig::default();

        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SECRET.to_string());

        Self {
            jwt: JwtConfig {
                secret,
                access_token_expiry: ttl_env_or("JWT_ACCESS_TOKEN_EXPIRY", 900),
            },
            session: SessionConfig {
                refresh_token_expiry: ttl_env_or(
                    "JWT_REFRESH_TOKEN_EXPIRY",
                    defaults.refresh_token_expiry,
                ),
                store_timeout: env_or("STORE_TIMEOUT_SECONDS", defaults.store_timeout),
                bcrypt_cost: env_or("BCRYPT_COST", defaults.bcrypt_cost),
                cleanup_interval: env_or("TOKEN_CLEANUP_INTERVAL_SECONDS", defaults.cleanup_interval),
                cleanup_enabled: env_or("TOKEN_CLEANUP_ENABLED", defaults.cleanup_enabled),
            },
        }
    }

    /// Get JWT secret
    pub fn jwt_secret(&self) -> &str {
        &self.jwt.secret
    }

    /// Get access token expiry in seconds
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.jwt.access_token_expiry
    }

    /// Get refresh token expiry in seconds
    pub fn refresh_token_expiry_seconds(&self) -> i64 {
        self.session.refresh_token_expiry
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Reads a token lifetime, clamped to `1..=MAX_TOKEN_TTL_SECONDS`
fn ttl_env_or(key: &str, default: i64) -> i64 {
    let seconds = env_or(key, default);
    let bounded = bound_ttl(seconds);
    if bounded != seconds {
        tracing::warn!(key, seconds, bounded, "Token lifetime out of range, clamped");
    }
    bounded
}

fn bound_ttl(seconds: i64) -> i64 {
    seconds.clamp(1, MAX_TOKEN_TTL_SECONDS)
}

fn default_store_timeout() -> u64 {
    3
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_cleanup_enabled() -> bool {
    true
}

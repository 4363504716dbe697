//! Token entities: signed access token claims and persisted refresh sessions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access token lifetime (15 minutes)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 900;

/// Refresh token lifetime (24 hours)
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 86_400;

/// Claims structure for JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID, decimal string)
    pub sub: String,

    /// Username at the time of issuance, may be empty
    #[serde(default)]
    pub username: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

impl Claims {
    /// Creates claims for an access token valid for `ttl_seconds` from now
    pub fn new(user_id: i64, username: impl Into<String>, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        let expiry = now + Duration::seconds(ttl_seconds);

        Self {
            sub: user_id.to_string(),
            username: username.into(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets the user ID from the subject
    pub fn user_id(&self) -> Result<i64, std::num::ParseIntError> {
        self.sub.parse()
    }
}

/// Lifecycle state of a refresh token, derived from its stored fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    /// Not revoked and not past expiry
    Active,
    /// Not revoked but past expiry; detected on read
    Expired,
    /// Revoked because it was exchanged for `replaced_by`
    Rotated { replaced_by: i64 },
    /// Revoked with no successor (cascade, logout, or expiry handling)
    Revoked,
}

/// Refresh token record stored in the database
///
/// Only the SHA-256 digest of the opaque secret is kept. `revoked` moves from
/// `false` to `true` at most once and `replaced_by` never changes once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Store-assigned identifier
    pub id: i64,

    /// Owning user
    pub user_id: i64,

    /// Hex-encoded digest of the raw secret, unique across all records
    pub token_hash: String,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    pub revoked: bool,

    /// The record this one was rotated into
    pub replaced_by: Option<i64>,

    /// Optional device or client label
    pub device_info: Option<String>,
}

impl RefreshToken {
    /// Derives the lifecycle state at `now`
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        match (self.revoked, self.replaced_by) {
            (true, Some(replaced_by)) => RefreshTokenState::Rotated { replaced_by },
            (true, None) => RefreshTokenState::Revoked,
            (false, _) if self.expires_at <= now => RefreshTokenState::Expired,
            (false, _) => RefreshTokenState::Active,
        }
    }

    /// Derives the lifecycle state right now
    pub fn state(&self) -> RefreshTokenState {
        self.state_at(Utc::now())
    }

    /// Checks if the refresh token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// A token is active if it is neither revoked nor expired
    pub fn is_active(&self) -> bool {
        self.state() == RefreshTokenState::Active
    }

    /// Gets the time remaining until expiration, or zero if expired
    pub fn time_until_expiration(&self) -> Duration {
        let now = Utc::now();
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}

/// A refresh token row that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefreshToken {
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub device_info: Option<String>,
}

impl NewRefreshToken {
    /// Creates a row expiring `ttl_seconds` from now
    pub fn new(
        user_id: i64,
        token_hash: String,
        ttl_seconds: i64,
        device_info: Option<String>,
    ) -> Self {
        Self {
            user_id,
            token_hash,
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
            device_info,
        }
    }

    /// Materialises the stored record once the store has assigned an id
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> RefreshToken {
        RefreshToken {
            id,
            user_id: self.user_id,
            token_hash: self.token_hash,
            created_at,
            expires_at: self.expires_at,
            revoked: false,
            replaced_by: None,
            device_info: self.device_info,
        }
    }
}

//! Token pair value object returned by login and refresh.

use serde::{Deserialize, Serialize};

/// A freshly issued access token together with its refresh secret
///
/// The raw refresh secret exists only here; the store keeps its digest.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    /// Owner of both tokens
    pub user_id: i64,

    /// Signed HS256 access token
    pub access_token: String,

    /// Access token lifetime in seconds
    pub access_expires_in: i64,

    /// Opaque refresh secret (hex)
    pub refresh_token: String,

    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    pub fn new(
        user_id: i64,
        access_token: String,
        access_expires_in: i64,
        refresh_token: String,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            user_id,
            access_token,
            access_expires_in,
            refresh_token,
            refresh_expires_in,
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("access_expires_in", &self.access_expires_in)
            .field("refresh_token", &"[REDACTED]")
            .field("refresh_expires_in", &self.refresh_expires_in)
            .finish()
    }
}

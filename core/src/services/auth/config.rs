//! Configuration for the authentication service

use authn_shared::SessionConfig;

/// Configuration for the authentication service
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
    /// Longest accepted username, in characters
    pub max_username_length: usize,
    /// Longest accepted password, in bytes (bcrypt ignores anything past 72)
    pub max_password_length: usize,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_username_length: 64,
            max_password_length: 72,
        }
    }
}

impl AuthServiceConfig {
    pub fn from_session_config(session: &SessionConfig) -> Self {
        Self {
            bcrypt_cost: session.bcrypt_cost,
            ..Self::default()
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}

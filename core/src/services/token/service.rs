//! Token lifecycle service: issuance, rotation, reuse detection, revocation

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::domain::entities::token::{Claims, NewRefreshToken, RefreshToken, RefreshTokenState};
use crate::domain::entities::user::User;
use crate::domain::value_objects::TokenPair;
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::{Rotation, TokenRepository, UserRepository};

use super::config::TokenServiceConfig;
use super::generator::{hash_token, OpaqueTokenGenerator};
use super::signer::ClaimsSigner;

/// Service that owns every refresh token state transition
///
/// Refresh tokens are single-use. Presenting one that has already been
/// revoked, for any reason, revokes every session the user holds.
pub struct TokenService<R: TokenRepository, U: UserRepository> {
    tokens: Arc<R>,
    users: Arc<U>,
    signer: ClaimsSigner,
    generator: OpaqueTokenGenerator,
    config: TokenServiceConfig,
}

impl<R: TokenRepository, U: UserRepository> TokenService<R, U> {
    /// Creates a new token service instance
    ///
    /// # Returns
    ///
    /// A new `TokenService`, or an error if the signing secret is unusable
    pub fn new(
        tokens: Arc<R>,
        users: Arc<U>,
        config: TokenServiceConfig,
    ) -> Result<Self, DomainError> {
        let signer = ClaimsSigner::new(&config.jwt_secret)?;

        Ok(Self {
            tokens,
            users,
            signer,
            generator: OpaqueTokenGenerator::new(),
            config,
        })
    }

    /// The signer, for gates that only need to verify access tokens
    pub fn signer(&self) -> &ClaimsSigner {
        &self.signer
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Issues an access token and a new refresh session for a user
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - Both tokens; one refresh record was stored
    /// * `Err(DomainError)` - Signing, randomness, or storage failed
    pub async fn issue(&self, user: &User, device_info: Option<String>) -> DomainResult<TokenPair> {
        let access_token =
            self.signer
                .issue(user.id, &user.username, self.config.access_token_ttl_seconds)?;

        let opaque = self.generator.generate()?;
        let pending = NewRefreshToken::new(
            user.id,
            opaque.digest,
            self.config.refresh_token_ttl_seconds,
            device_info,
        );
        let token_id = self
            .with_deadline("insert", self.tokens.insert(pending))
            .await?;

        debug!(user_id = user.id, token_id, "Issued token pair");

        Ok(self.pair(user.id, access_token, opaque.raw))
    }

    /// Exchanges a refresh secret for a new token pair
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - The presented token is now permanently revoked
    /// * `Err(TokenError::InvalidRefreshToken)` - Unknown or reused token
    /// * `Err(TokenError::RefreshTokenExpired)` - Natural expiry
    /// * `Err(DomainError::StorageUnavailable)` - Store failed or timed out
    pub async fn refresh(&self, raw_token: &str) -> DomainResult<TokenPair> {
        let digest = hash_token(raw_token);

        let record = match self
            .with_deadline("lookup_by_hash", self.tokens.lookup_by_hash(&digest))
            .await?
        {
            Some(record) => record,
            None => {
                debug!("Refresh token not found");
                return Err(TokenError::InvalidRefreshToken.into());
            }
        };

        match record.state() {
            RefreshTokenState::Active => self.rotate(record).await,
            RefreshTokenState::Expired => self.expire(&record).await,
            RefreshTokenState::Rotated { .. } | RefreshTokenState::Revoked => {
                warn!(
                    user_id = record.user_id,
                    token_id = record.id,
                    replaced_by = ?record.replaced_by,
                    "Refresh token reuse detected"
                );
                self.cascade(record.user_id).await?;
                Err(TokenError::InvalidRefreshToken.into())
            }
        }
    }

    /// Rotates an active record into a fresh one
    async fn rotate(&self, record: RefreshToken) -> DomainResult<TokenPair> {
        let user = match self
            .with_deadline("find_user", self.users.find_by_id(record.user_id))
            .await?
        {
            Some(user) => user,
            None => {
                warn!(
                    user_id = record.user_id,
                    token_id = record.id,
                    "Refresh token owner no longer exists"
                );
                self.cascade(record.user_id).await?;
                return Err(TokenError::InvalidRefreshToken.into());
            }
        };

        let access_token =
            self.signer
                .issue(user.id, &user.username, self.config.access_token_ttl_seconds)?;

        let opaque = self.generator.generate()?;
        let successor = NewRefreshToken::new(
            user.id,
            opaque.digest,
            self.config.refresh_token_ttl_seconds,
            record.device_info.clone(),
        );

        match self
            .with_deadline("rotate", self.tokens.rotate(record.id, successor))
            .await
        {
            Ok(Rotation::Rotated { new_id }) => {
                info!(
                    user_id = user.id,
                    token_id = record.id,
                    new_token_id = new_id,
                    "Refresh token rotated"
                );
                Ok(self.pair(user.id, access_token, opaque.raw))
            }
            Ok(Rotation::Expired) => self.expire(&record).await,
            Ok(Rotation::AlreadyConsumed) => {
                warn!(
                    user_id = user.id,
                    token_id = record.id,
                    "Refresh token consumed concurrently"
                );
                self.cascade(user.id).await?;
                Err(TokenError::InvalidRefreshToken.into())
            }
            Err(e) => {
                // The rotation may have partially applied; do not leave two live tokens
                error!(
                    user_id = user.id,
                    token_id = record.id,
                    error = %e,
                    "Refresh token rotation failed"
                );
                if let Err(cascade_error) = self.cascade(user.id).await {
                    error!(
                        user_id = user.id,
                        error = %cascade_error,
                        "Fallback revocation failed"
                    );
                }
                Err(e)
            }
        }
    }

    /// Retires a naturally expired record without touching its siblings
    async fn expire<T>(&self, record: &RefreshToken) -> DomainResult<T> {
        self.with_deadline("mark_revoked", self.tokens.mark_revoked(record.id, None))
            .await?;
        info!(
            user_id = record.user_id,
            token_id = record.id,
            "Refresh token expired"
        );
        Err(TokenError::RefreshTokenExpired.into())
    }

    /// Revokes every outstanding refresh token for a user
    ///
    /// Idempotent; a second call returns zero.
    pub async fn revoke_all(&self, user_id: i64) -> DomainResult<usize> {
        let revoked = self
            .with_deadline("revoke_all", self.tokens.revoke_all(user_id))
            .await?;
        info!(user_id, revoked, "Revoked all refresh tokens");
        Ok(revoked)
    }

    /// Verifies an access token and returns the claims
    pub fn verify_access_token(&self, token: &str) -> DomainResult<Claims> {
        self.signer.verify(token)
    }

    /// Follows `replaced_by` links from `id`, oldest first
    ///
    /// Stops at the first record without a successor, at a dangling link, or
    /// after `max_chain_length` records.
    pub async fn rotation_chain(&self, id: i64) -> DomainResult<Vec<RefreshToken>> {
        let mut chain = Vec::new();
        let mut next = Some(id);

        while let Some(current) = next {
            if chain.len() >= self.config.max_chain_length {
                warn!(start_id = id, "Rotation chain exceeded hop limit");
                break;
            }

            let record = match self
                .with_deadline("find_by_id", self.tokens.find_by_id(current))
                .await?
            {
                Some(record) => record,
                None => break,
            };

            next = record.replaced_by;
            chain.push(record);
        }

        Ok(chain)
    }

    async fn cascade(&self, user_id: i64) -> DomainResult<usize> {
        let revoked = self
            .with_deadline("revoke_all", self.tokens.revoke_all(user_id))
            .await?;
        warn!(user_id, revoked, "Revoked all sessions after suspected token theft");
        Ok(revoked)
    }

    fn pair(&self, user_id: i64, access_token: String, refresh_token: String) -> TokenPair {
        TokenPair::new(
            user_id,
            access_token,
            self.config.access_token_ttl_seconds,
            refresh_token,
            self.config.refresh_token_ttl_seconds,
        )
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, call: F) -> DomainResult<T>
    where
        F: Future<Output = DomainResult<T>>,
    {
        with_deadline(self.config.store_timeout, operation, call).await
    }
}

/// Bounds a store call by `store_timeout`
///
/// A call that overruns maps to `DomainError::StorageUnavailable`.
pub(crate) async fn with_deadline<T, F>(
    store_timeout: Duration,
    operation: &'static str,
    call: F,
) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    match tokio::time::timeout(store_timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, "Store call timed out");
            Err(DomainError::storage(format!("{} timed out", operation)))
        }
    }
}

//! Token repository trait defining the session store contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::token::{NewRefreshToken, RefreshToken};
use crate::errors::DomainError;

/// Outcome of an atomic rotation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// The current record was revoked and now points at `new_id`
    Rotated { new_id: i64 },
    /// Another caller revoked the current record first; nothing is left pending
    AlreadyConsumed,
    /// The current record is unrevoked but past expiry; nothing was written
    Expired,
}

/// Repository trait for refresh token persistence
///
/// The store only persists what the token service instructs. Every lookup
/// distinguishes three outcomes: `Ok(Some(_))` found, `Ok(None)` not found,
/// `Err(DomainError::StorageUnavailable)` when the backend failed.
///
/// # Security Considerations
/// - Only the digest of a refresh secret is ever passed in
/// - `revoked` transitions are conditional and one-way
/// - `revoke_all` is idempotent so concurrent cascades never conflict
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a new, non-revoked record and return its store-assigned id
    ///
    /// # Example
    /// ```no_run
    /// # use authn_core::repositories::TokenRepository;
    /// # use authn_core::domain::entities::token::NewRefreshToken;
    /// # async fn example(repo: &impl TokenRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let pending = NewRefreshToken::new(7, "digest".to_string(), 86_400, None);
    /// let id = repo.insert(pending).await?;
    /// println!("Stored refresh token {}", id);
    /// # Ok(())
    /// # }
    /// ```
    async fn insert(&self, token: NewRefreshToken) -> Result<i64, DomainError>;

    /// Find a refresh token by its digest
    ///
    /// # Returns
    /// * `Ok(Some(RefreshToken))` - Token found, in any state
    /// * `Ok(None)` - No record with this digest
    /// * `Err(DomainError)` - Storage failure
    async fn lookup_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError>;

    /// Find a refresh token by its id
    async fn find_by_id(&self, id: i64) -> Result<Option<RefreshToken>, DomainError>;

    /// Conditionally revoke a single record
    ///
    /// Only acts on a record that is not yet revoked. `replaced_by` is written
    /// in the same step, so a record that already carries a successor keeps it.
    ///
    /// # Returns
    /// * `Ok(true)` - The record moved from active to revoked
    /// * `Ok(false)` - Already revoked or missing; nothing changed
    async fn mark_revoked(&self, id: i64, replaced_by: Option<i64>) -> Result<bool, DomainError>;

    /// Revoke every non-revoked record owned by a user
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records that changed; zero on a repeat call
    ///
    /// # Example
    /// ```no_run
    /// # use authn_core::repositories::TokenRepository;
    /// # async fn example(repo: &impl TokenRepository) -> Result<(), Box<dyn std::error::Error>> {
    /// let revoked = repo.revoke_all(7).await?;
    /// println!("Revoked {} sessions", revoked);
    /// # Ok(())
    /// # }
    /// ```
    async fn revoke_all(&self, user_id: i64) -> Result<usize, DomainError>;

    /// Delete records whose expiry is earlier than `before`
    ///
    /// This method should be called periodically to garbage-collect old sessions.
    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<usize, DomainError>;

    /// Insert `successor` and revoke `current_id` pointing at it, as one unit
    ///
    /// The default composes `insert` with the conditional `mark_revoked`. When
    /// the mark loses a race the successor stays stored but unreachable; callers
    /// treat `AlreadyConsumed` as reuse and revoke the user's whole family, which
    /// covers it. Backends with transactions should override this.
    async fn rotate(
        &self,
        current_id: i64,
        successor: NewRefreshToken,
    ) -> Result<Rotation, DomainError> {
        match self.find_by_id(current_id).await? {
            Some(current) if current.revoked => return Ok(Rotation::AlreadyConsumed),
            Some(current) if current.is_expired() => return Ok(Rotation::Expired),
            Some(_) => {}
            None => return Ok(Rotation::AlreadyConsumed),
        }

        let new_id = self.insert(successor).await?;
        if self.mark_revoked(current_id, Some(new_id)).await? {
            Ok(Rotation::Rotated { new_id })
        } else {
            Ok(Rotation::AlreadyConsumed)
        }
    }
}

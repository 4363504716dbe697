//! In-memory implementation of TokenRepository
//!
//! Used by tests and local runs without a database. All mutations take the
//! write lock, so `rotate` is atomic with respect to concurrent callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::token::{NewRefreshToken, RefreshToken, RefreshTokenState};
use crate::errors::DomainError;

use super::r#trait::{Rotation, TokenRepository};

#[derive(Default)]
struct Store {
    next_id: i64,
    by_id: HashMap<i64, RefreshToken>,
    id_by_hash: HashMap<String, i64>,
}

impl Store {
    fn insert(&mut self, token: NewRefreshToken) -> Result<i64, DomainError> {
        if self.id_by_hash.contains_key(&token.token_hash) {
            return Err(DomainError::Validation {
                message: "Token hash already exists".to_string(),
            });
        }

        self.next_id += 1;
        let id = self.next_id;
        self.id_by_hash.insert(token.token_hash.clone(), id);
        self.by_id.insert(id, token.into_record(id, Utc::now()));
        Ok(id)
    }

    fn mark_revoked(&mut self, id: i64, replaced_by: Option<i64>) -> bool {
        match self.by_id.get_mut(&id) {
            Some(token) if !token.revoked => {
                token.revoked = true;
                token.replaced_by = replaced_by;
                true
            }
            _ => false,
        }
    }
}

/// Token repository backed by a `HashMap`
#[derive(Clone, Default)]
pub struct InMemoryTokenRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryTokenRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record owned by a user, ordered by id
    pub async fn tokens_for_user(&self, user_id: i64) -> Vec<RefreshToken> {
        let store = self.store.read().await;
        let mut tokens: Vec<_> = store
            .by_id
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.id);
        tokens
    }

    /// Overwrite a record's expiry, for exercising expiry paths
    pub async fn set_expires_at(&self, id: i64, expires_at: DateTime<Utc>) -> bool {
        let mut store = self.store.write().await;
        match store.by_id.get_mut(&id) {
            Some(token) => {
                token.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    /// Total number of stored records
    pub async fn len(&self) -> usize {
        self.store.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, token: NewRefreshToken) -> Result<i64, DomainError> {
        self.store.write().await.insert(token)
    }

    async fn lookup_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let store = self.store.read().await;
        Ok(store
            .id_by_hash
            .get(token_hash)
            .and_then(|id| store.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<RefreshToken>, DomainError> {
        Ok(self.store.read().await.by_id.get(&id).cloned())
    }

    async fn mark_revoked(&self, id: i64, replaced_by: Option<i64>) -> Result<bool, DomainError> {
        Ok(self.store.write().await.mark_revoked(id, replaced_by))
    }

    async fn revoke_all(&self, user_id: i64) -> Result<usize, DomainError> {
        let mut store = self.store.write().await;
        let mut count = 0;

        for token in store.by_id.values_mut() {
            if token.user_id == user_id && !token.revoked {
                token.revoked = true;
                count += 1;
            }
        }

        Ok(count)
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut store = self.store.write().await;
        let expired: Vec<(i64, String)> = store
            .by_id
            .values()
            .filter(|t| t.expires_at < before)
            .map(|t| (t.id, t.token_hash.clone()))
            .collect();

        for (id, hash) in &expired {
            store.by_id.remove(id);
            store.id_by_hash.remove(hash);
        }

        Ok(expired.len())
    }

    async fn rotate(
        &self,
        current_id: i64,
        successor: NewRefreshToken,
    ) -> Result<Rotation, DomainError> {
        let mut store = self.store.write().await;

        match store.by_id.get(&current_id).map(|t| t.state()) {
            Some(RefreshTokenState::Active) => {}
            Some(RefreshTokenState::Expired) => return Ok(Rotation::Expired),
            _ => return Ok(Rotation::AlreadyConsumed),
        }

        let new_id = store.insert(successor)?;
        store.mark_revoked(current_id, Some(new_id));
        Ok(Rotation::Rotated { new_id })
    }
}

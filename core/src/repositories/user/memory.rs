//! In-memory implementation of UserRepository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainError};

use super::r#trait::UserRepository;

#[derive(Default)]
struct Store {
    next_id: i64,
    users: HashMap<i64, User>,
}

/// User repository backed by a `HashMap`
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user, for exercising the orphaned-session path
    pub async fn remove(&self, id: i64) -> bool {
        self.store.write().await.users.remove(&id).is_some()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, DomainError> {
        let mut store = self.store.write().await;

        if store.users.values().any(|u| u.username == username) {
            return Err(AuthError::UserAlreadyExists.into());
        }

        store.next_id += 1;
        let user = User::new(store.next_id, username, password_hash);
        store.users.insert(user.id, user.clone());
        Ok(user)
    }
}

//! Unit tests for the token lifecycle service

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::token::{NewRefreshToken, RefreshToken, RefreshTokenState};
use crate::domain::entities::user::User;
use crate::errors::{DomainError, TokenError};
use crate::repositories::{
    InMemoryTokenRepository, InMemoryUserRepository, Rotation, TokenRepository, UserRepository,
};
use crate::services::token::{hash_token, TokenService, TokenServiceConfig};

type Service<R> = TokenService<R, InMemoryUserRepository>;

/// Token repository that can be told to fail or stall on specific calls
#[derive(Default)]
struct FaultyTokenRepository {
    inner: InMemoryTokenRepository,
    fail_rotate: AtomicBool,
    fail_revoke_all: AtomicBool,
    stall_lookup: AtomicBool,
    expire_before_rotate: AtomicBool,
}

fn unavailable() -> DomainError {
    DomainError::storage("connection reset")
}

#[async_trait]
impl TokenRepository for FaultyTokenRepository {
    async fn insert(&self, token: NewRefreshToken) -> Result<i64, DomainError> {
        self.inner.insert(token).await
    }

    async fn lookup_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        if self.stall_lookup.load(Ordering::SeqCst) {
            tokio::time::sleep(StdDuration::from_secs(30)).await;
        }
        self.inner.lookup_by_hash(token_hash).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<RefreshToken>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn mark_revoked(&self, id: i64, replaced_by: Option<i64>) -> Result<bool, DomainError> {
        self.inner.mark_revoked(id, replaced_by).await
    }

    async fn revoke_all(&self, user_id: i64) -> Result<usize, DomainError> {
        if self.fail_revoke_all.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.revoke_all(user_id).await
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<usize, DomainError> {
        self.inner.delete_expired(before).await
    }

    async fn rotate(
        &self,
        current_id: i64,
        successor: NewRefreshToken,
    ) -> Result<Rotation, DomainError> {
        if self.fail_rotate.load(Ordering::SeqCst) {
            // The successor lands but the old record is never marked
            self.inner.insert(successor).await?;
            return Err(unavailable());
        }
        if self.expire_before_rotate.load(Ordering::SeqCst) {
            self.inner
                .set_expires_at(current_id, Utc::now() - Duration::seconds(1))
                .await;
        }
        self.inner.rotate(current_id, successor).await
    }
}

fn config() -> TokenServiceConfig {
    TokenServiceConfig::default().with_secret("service-test-secret")
}

async fn setup() -> (
    Service<InMemoryTokenRepository>,
    Arc<InMemoryTokenRepository>,
    Arc<InMemoryUserRepository>,
    User,
) {
    let tokens = Arc::new(InMemoryTokenRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let user = users.create("alice", "hash").await.unwrap();
    let service = TokenService::new(tokens.clone(), users.clone(), config()).unwrap();
    (service, tokens, users, user)
}

fn is_invalid_refresh(result: &Result<impl std::fmt::Debug, DomainError>) -> bool {
    matches!(result, Err(DomainError::Token(TokenError::InvalidRefreshToken)))
}

#[tokio::test]
async fn test_new_rejects_empty_secret() {
    let result = TokenService::new(
        Arc::new(InMemoryTokenRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
        TokenServiceConfig::default().with_secret(""),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_issue_stores_only_digest() {
    let (service, tokens, _, user) = setup().await;

    let pair = service.issue(&user, Some("web".to_string())).await.unwrap();

    assert_eq!(pair.user_id, user.id);
    assert_eq!(pair.access_expires_in, 900);
    assert_eq!(pair.refresh_expires_in, 86_400);

    let stored = tokens.tokens_for_user(user.id).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].token_hash, hash_token(&pair.refresh_token));
    assert_ne!(stored[0].token_hash, pair.refresh_token);
    assert_eq!(stored[0].state(), RefreshTokenState::Active);
    assert_eq!(stored[0].device_info.as_deref(), Some("web"));
}

#[tokio::test]
async fn test_issue_access_token_carries_identity() {
    let (service, _, _, user) = setup().await;

    let pair = service.issue(&user, None).await.unwrap();
    let claims = service.verify_access_token(&pair.access_token).unwrap();

    assert_eq!(claims.user_id().unwrap(), user.id);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.exp - claims.iat, 900);
}

#[tokio::test]
async fn test_refresh_rotates() {
    let (service, tokens, _, user) = setup().await;
    let first = service.issue(&user, Some("ios".to_string())).await.unwrap();

    let second = service.refresh(&first.refresh_token).await.unwrap();

    assert_ne!(second.refresh_token, first.refresh_token);
    assert_eq!(second.user_id, user.id);
    assert!(service.verify_access_token(&second.access_token).is_ok());

    let old = tokens
        .lookup_by_hash(&hash_token(&first.refresh_token))
        .await
        .unwrap()
        .unwrap();
    let new = tokens
        .lookup_by_hash(&hash_token(&second.refresh_token))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(old.state(), RefreshTokenState::Rotated { replaced_by: new.id });
    assert_eq!(new.state(), RefreshTokenState::Active);
    assert_eq!(new.device_info.as_deref(), Some("ios"));
}

#[tokio::test]
async fn test_refresh_unknown_token_has_no_side_effect() {
    let (service, tokens, _, user) = setup().await;
    service.issue(&user, None).await.unwrap();

    let result = service.refresh("deadbeef").await;

    assert!(is_invalid_refresh(&result));
    assert!(tokens.tokens_for_user(user.id).await.iter().all(|t| !t.revoked));
}

#[tokio::test]
async fn test_reuse_of_rotated_token_cascades() {
    let (service, tokens, _, user) = setup().await;
    let r1 = service.issue(&user, None).await.unwrap();
    let other_device = service.issue(&user, None).await.unwrap();
    let r2 = service.refresh(&r1.refresh_token).await.unwrap();

    let replay = service.refresh(&r1.refresh_token).await;
    assert!(is_invalid_refresh(&replay));

    // Every session for the user is gone, including the legitimate successor
    assert!(tokens.tokens_for_user(user.id).await.iter().all(|t| t.revoked));
    assert!(is_invalid_refresh(&service.refresh(&r2.refresh_token).await));
    assert!(is_invalid_refresh(
        &service.refresh(&other_device.refresh_token).await
    ));
}

#[tokio::test]
async fn test_reuse_of_revoked_token_cascades() {
    let (service, tokens, users, user) = setup().await;
    let bob = users.create("bob", "hash").await.unwrap();
    let pair = service.issue(&user, None).await.unwrap();
    let sibling = service.issue(&user, None).await.unwrap();
    let bobs = service.issue(&bob, None).await.unwrap();

    let record = tokens
        .lookup_by_hash(&hash_token(&pair.refresh_token))
        .await
        .unwrap()
        .unwrap();
    tokens.mark_revoked(record.id, None).await.unwrap();

    assert!(is_invalid_refresh(&service.refresh(&pair.refresh_token).await));
    assert!(is_invalid_refresh(&service.refresh(&sibling.refresh_token).await));

    // Other users are unaffected
    assert!(service.refresh(&bobs.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_expired_token_revoked_without_cascade() {
    let (service, tokens, _, user) = setup().await;
    let stale = service.issue(&user, None).await.unwrap();
    let live = service.issue(&user, None).await.unwrap();

    let record = tokens
        .lookup_by_hash(&hash_token(&stale.refresh_token))
        .await
        .unwrap()
        .unwrap();
    tokens
        .set_expires_at(record.id, Utc::now() - Duration::seconds(1))
        .await;

    let result = service.refresh(&stale.refresh_token).await;
    assert!(matches!(
        result,
        Err(DomainError::Token(TokenError::RefreshTokenExpired))
    ));

    let after = tokens.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(after.state(), RefreshTokenState::Revoked);

    // The other session survives natural expiry of a sibling
    assert!(service.refresh(&live.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_expiry_during_rotation_is_not_reuse() {
    let tokens = Arc::new(FaultyTokenRepository::default());
    let users = Arc::new(InMemoryUserRepository::new());
    let user = users.create("alice", "hash").await.unwrap();
    let service: Service<FaultyTokenRepository> =
        TokenService::new(tokens.clone(), users, config()).unwrap();

    let racing = service.issue(&user, None).await.unwrap();
    let sibling = service.issue(&user, None).await.unwrap();
    tokens.expire_before_rotate.store(true, Ordering::SeqCst);

    let result = service.refresh(&racing.refresh_token).await;
    assert!(matches!(
        result,
        Err(DomainError::Token(TokenError::RefreshTokenExpired))
    ));

    let stored = tokens.inner.tokens_for_user(user.id).await;
    assert_eq!(stored.len(), 2, "no successor was written");
    assert_eq!(stored[0].state(), RefreshTokenState::Revoked);
    assert_eq!(stored[1].state(), RefreshTokenState::Active);

    tokens.expire_before_rotate.store(false, Ordering::SeqCst);
    assert!(service.refresh(&sibling.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_missing_user_cascades() {
    let (service, tokens, users, user) = setup().await;
    let pair = service.issue(&user, None).await.unwrap();
    users.remove(user.id).await;

    assert!(is_invalid_refresh(&service.refresh(&pair.refresh_token).await));
    assert!(tokens.tokens_for_user(user.id).await.iter().all(|t| t.revoked));
}

#[tokio::test]
async fn test_refresh_uses_current_username() {
    let (service, _, users, _) = setup().await;
    let user = users.create("carol", "hash").await.unwrap();
    let pair = service.issue(&user, None).await.unwrap();

    let renewed = service.refresh(&pair.refresh_token).await.unwrap();
    let claims = service.verify_access_token(&renewed.access_token).unwrap();

    assert_eq!(claims.username, "carol");
}

#[tokio::test]
async fn test_revoke_all_is_idempotent() {
    let (service, _, _, user) = setup().await;
    let first = service.issue(&user, None).await.unwrap();
    service.issue(&user, None).await.unwrap();

    assert_eq!(service.revoke_all(user.id).await.unwrap(), 2);
    assert_eq!(service.revoke_all(user.id).await.unwrap(), 0);
    assert!(is_invalid_refresh(&service.refresh(&first.refresh_token).await));
}

#[tokio::test]
async fn test_rotation_chain() {
    let (service, tokens, _, user) = setup().await;
    let r1 = service.issue(&user, None).await.unwrap();
    let r2 = service.refresh(&r1.refresh_token).await.unwrap();
    let r3 = service.refresh(&r2.refresh_token).await.unwrap();

    let head = tokens
        .lookup_by_hash(&hash_token(&r1.refresh_token))
        .await
        .unwrap()
        .unwrap();
    let chain = service.rotation_chain(head.id).await.unwrap();

    assert_eq!(chain.len(), 3);
    assert_eq!(chain[2].token_hash, hash_token(&r3.refresh_token));
    assert_eq!(
        chain.iter().filter(|t| t.state() == RefreshTokenState::Active).count(),
        1
    );
}

#[tokio::test]
async fn test_rotation_chain_respects_hop_limit() {
    let tokens = Arc::new(InMemoryTokenRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let user = users.create("alice", "hash").await.unwrap();
    let config = TokenServiceConfig {
        max_chain_length: 2,
        ..config()
    };
    let service = TokenService::new(tokens.clone(), users, config).unwrap();

    let mut pair = service.issue(&user, None).await.unwrap();
    let head = tokens
        .lookup_by_hash(&hash_token(&pair.refresh_token))
        .await
        .unwrap()
        .unwrap();
    for _ in 0..4 {
        pair = service.refresh(&pair.refresh_token).await.unwrap();
    }

    assert_eq!(service.rotation_chain(head.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rotation_failure_falls_back_to_cascade() {
    let tokens = Arc::new(FaultyTokenRepository::default());
    let users = Arc::new(InMemoryUserRepository::new());
    let user = users.create("alice", "hash").await.unwrap();
    let service: Service<FaultyTokenRepository> =
        TokenService::new(tokens.clone(), users, config()).unwrap();

    let pair = service.issue(&user, None).await.unwrap();
    tokens.fail_rotate.store(true, Ordering::SeqCst);

    let result = service.refresh(&pair.refresh_token).await;

    assert!(matches!(result, Err(DomainError::StorageUnavailable { .. })));
    let stored = tokens.inner.tokens_for_user(user.id).await;
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|t| t.revoked));
}

#[tokio::test]
async fn test_cascade_failure_is_reported() {
    let tokens = Arc::new(FaultyTokenRepository::default());
    let users = Arc::new(InMemoryUserRepository::new());
    let user = users.create("alice", "hash").await.unwrap();
    let service: Service<FaultyTokenRepository> =
        TokenService::new(tokens.clone(), users, config()).unwrap();

    let r1 = service.issue(&user, None).await.unwrap();
    service.refresh(&r1.refresh_token).await.unwrap();
    tokens.fail_revoke_all.store(true, Ordering::SeqCst);

    let result = service.refresh(&r1.refresh_token).await;
    assert!(matches!(result, Err(DomainError::StorageUnavailable { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_store_timeout() {
    let tokens = Arc::new(FaultyTokenRepository::default());
    let users = Arc::new(InMemoryUserRepository::new());
    let user = users.create("alice", "hash").await.unwrap();
    let service: Service<FaultyTokenRepository> =
        TokenService::new(tokens.clone(), users, config()).unwrap();

    let pair = service.issue(&user, None).await.unwrap();
    tokens.stall_lookup.store(true, Ordering::SeqCst);

    let result = service.refresh(&pair.refresh_token).await;

    assert!(matches!(result, Err(DomainError::StorageUnavailable { .. })));
    assert!(result.unwrap_err().is_transient());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_single_winner() {
    let (service, tokens, _, user) = setup().await;
    let service = Arc::new(service);
    let pair = service.issue(&user, None).await.unwrap();

    let a = {
        let service = service.clone();
        let raw = pair.refresh_token.clone();
        tokio::spawn(async move { service.refresh(&raw).await })
    };
    let b = {
        let service = service.clone();
        let raw = pair.refresh_token.clone();
        tokio::spawn(async move { service.refresh(&raw).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let rejections = results.iter().filter(|r| is_invalid_refresh(*r)).count();

    assert_eq!(successes, 1);
    assert_eq!(rejections, 1);
    // The race is treated as reuse, so nothing stays live
    assert!(tokens.tokens_for_user(user.id).await.iter().all(|t| t.revoked));
}

#[tokio::test]
async fn test_login_refresh_replay_scenario() {
    let (service, _, _, user) = setup().await;

    let login = service.issue(&user, None).await.unwrap();
    let renewed = service.refresh(&login.refresh_token).await.unwrap();

    // An attacker replays the captured original
    assert!(is_invalid_refresh(&service.refresh(&login.refresh_token).await));
    // The legitimate client is forced to log in again
    assert!(is_invalid_refresh(&service.refresh(&renewed.refresh_token).await));

    // Access tokens stay valid until they expire
    assert!(service.verify_access_token(&renewed.access_token).is_ok());
}

//! Unit tests for the in-memory user repository

use crate::errors::{AuthError, DomainError};
use crate::repositories::user::{InMemoryUserRepository, UserRepository};

#[tokio::test]
async fn test_create_and_find() {
    let repo = InMemoryUserRepository::new();

    let user = repo.create("alice", "hash").await.unwrap();
    assert_eq!(user.username, "alice");

    let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
    let by_id = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_name, by_id);
    assert!(repo.exists_by_username("alice").await.unwrap());
    assert!(!repo.exists_by_username("bob").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_username() {
    let repo = InMemoryUserRepository::new();
    repo.create("alice", "hash").await.unwrap();

    let result = repo.create("alice", "other").await;
    assert!(matches!(
        result,
        Err(DomainError::Auth(AuthError::UserAlreadyExists))
    ));
}

#[tokio::test]
async fn test_remove() {
    let repo = InMemoryUserRepository::new();
    let user = repo.create("alice", "hash").await.unwrap();

    assert!(repo.remove(user.id).await);
    assert!(repo.find_by_id(user.id).await.unwrap().is_none());
    assert!(!repo.remove(user.id).await);
}

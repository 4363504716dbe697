//! bcrypt password hashing on the blocking thread pool

use tokio::task;

use crate::errors::{DomainError, DomainResult};

/// Hashes a password with the given bcrypt cost
pub async fn hash_password(password: &str, cost: u32) -> DomainResult<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| DomainError::Internal {
            message: format!("Password hashing task failed: {}", e),
        })?
        .map_err(|e| DomainError::Internal {
            message: format!("Password hashing failed: {}", e),
        })
}

/// Checks a password against a stored bcrypt hash
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> DomainResult<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let verified = task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| DomainError::Internal {
            message: format!("Password verification task failed: {}", e),
        })?;

    match verified {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is unreadable");
            Ok(false)
        }
    }
}

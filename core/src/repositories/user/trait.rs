//! User repository trait defining the interface for user data persistence.
//!
//! Registration writes users; the token service only reads them to mint claims.

use async_trait::async_trait;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

/// Repository trait for User entity persistence operations
///
/// # Example Implementation
/// ```no_run
/// use async_trait::async_trait;
/// use authn_core::repositories::UserRepository;
/// use authn_core::domain::entities::user::User;
/// use authn_core::errors::DomainError;
///
/// struct MySqlUserRepository {
///     // database connection pool
/// }
///
/// #[async_trait]
/// impl UserRepository for MySqlUserRepository {
///     async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
///         // Implementation here
///         Ok(None)
///     }
///
///     // ... other methods
/// #   async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> { Ok(None) }
/// #   async fn create(&self, username: &str, password_hash: &str) -> Result<User, DomainError> { unimplemented!() }
/// }
/// ```
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their unique username
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No user with that username
    /// * `Err(DomainError)` - Storage failure
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by id
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError>;

    /// Create a user with an already-hashed password
    ///
    /// # Returns
    /// * `Ok(User)` - The stored user with its assigned id
    /// * `Err(DomainError::Auth(AuthError::UserAlreadyExists))` - Username taken
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, DomainError>;

    /// Check whether a username is already taken
    async fn exists_by_username(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_username(username).await?.is_some())
    }
}

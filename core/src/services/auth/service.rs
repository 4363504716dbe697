//! Main authentication service implementation

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entities::user::User;
use crate::domain::value_objects::TokenPair;
use crate::errors::{AuthError, DomainError, DomainResult, ValidationError};
use crate::repositories::{TokenRepository, UserRepository};
use crate::services::token::{with_deadline, TokenService};

use super::config::AuthServiceConfig;
use super::password::{hash_password, verify_password};

/// Authentication service for registration, login, refresh, and logout
pub struct AuthService<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    /// User repository for database operations
    user_repository: Arc<U>,
    /// Token service for the refresh token lifecycle
    token_service: Arc<TokenService<T, U>>,
    /// Service configuration
    config: AuthServiceConfig,
}

impl<U, T> AuthService<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `user_repository` - Repository for user data persistence
    /// * `token_service` - Service for token issuance and rotation
    /// * `config` - Service configuration
    pub fn new(
        user_repository: Arc<U>,
        token_service: Arc<TokenService<T, U>>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            user_repository,
            token_service,
            config,
        }
    }

    pub fn token_service(&self) -> &Arc<TokenService<T, U>> {
        &self.token_service
    }

    /// Register a new user
    ///
    /// The username is trimmed before use; the password is taken verbatim.
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The stored user
    /// * `Err(DomainError::ValidationErr)` - Empty or oversized input
    /// * `Err(DomainError::Auth(AuthError::UserAlreadyExists))` - Username taken
    pub async fn register(&self, username: &str, password: &str) -> DomainResult<User> {
        let (username, password) = self.validate_credentials(username, password)?;

        if self
            .with_deadline(
                "exists_by_username",
                self.user_repository.exists_by_username(username),
            )
            .await?
        {
            return Err(AuthError::UserAlreadyExists.into());
        }

        let password_hash = hash_password(password, self.config.bcrypt_cost).await?;
        let user = self
            .with_deadline(
                "create_user",
                self.user_repository.create(username, &password_hash),
            )
            .await?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token pair
    ///
    /// An unknown username and a wrong password produce the same error.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - Access token and a new refresh session
    /// * `Err(DomainError::Auth(AuthError::InvalidCredentials))` - Login rejected
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        device_info: Option<String>,
    ) -> DomainResult<TokenPair> {
        let (username, password) = self.validate_credentials(username, password)?;

        let user = match self
            .with_deadline(
                "find_by_username",
                self.user_repository.find_by_username(username),
            )
            .await?
        {
            Some(user) => user,
            None => {
                // Spend comparable time so unknown users are not distinguishable
                hash_password(password, self.config.bcrypt_cost).await?;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password(password, &user.password_hash).await? {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let pair = self.token_service.issue(&user, device_info).await?;
        info!(user_id = user.id, "User logged in");
        Ok(pair)
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        self.token_service.refresh(refresh_token).await
    }

    /// Logout a user from every session
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of refresh tokens revoked
    pub async fn logout(&self, user_id: i64) -> DomainResult<usize> {
        self.token_service.revoke_all(user_id).await
    }

    fn validate_credentials<'a>(
        &self,
        username: &'a str,
        password: &'a str,
    ) -> DomainResult<(&'a str, &'a str)> {
        let username = username.trim();

        if username.is_empty() {
            return Err(required("username"));
        }
        if password.is_empty() {
            return Err(required("password"));
        }
        if username.chars().count() > self.config.max_username_length {
            return Err(ValidationError::InvalidLength {
                field: "username".to_string(),
                min: 1,
                max: self.config.max_username_length,
            }
            .into());
        }
        if password.len() > self.config.max_password_length {
            return Err(ValidationError::InvalidLength {
                field: "password".to_string(),
                min: 1,
                max: self.config.max_password_length,
            }
            .into());
        }

        Ok((username, password))
    }

    async fn with_deadline<R, F>(&self, operation: &'static str, call: F) -> DomainResult<R>
    where
        F: Future<Output = DomainResult<R>>,
    {
        with_deadline(self.token_service.config().store_timeout, operation, call).await
    }
}

fn required(field: &str) -> DomainError {
    DomainError::ValidationErr(ValidationError::RequiredField {
        field: field.to_string(),
    })
}

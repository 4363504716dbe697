//! Shared wiring for the HTTP tests: in-memory repositories behind the real services

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;

use authn_api::AppState;
use authn_core::domain::TokenPair;
use authn_core::repositories::{InMemoryTokenRepository, InMemoryUserRepository};
use authn_core::services::{AuthService, AuthServiceConfig, TokenService, TokenServiceConfig};

pub const TEST_SECRET: &str = "http-test-signing-secret";

pub type TestState = AppState<InMemoryUserRepository, InMemoryTokenRepository>;

pub struct TestContext {
    pub state: web::Data<TestState>,
    pub users: Arc<InMemoryUserRepository>,
    pub tokens: Arc<InMemoryTokenRepository>,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let tokens = Arc::new(InMemoryTokenRepository::new());

        let token_service = Arc::new(
            TokenService::new(
                tokens.clone(),
                users.clone(),
                TokenServiceConfig::default().with_secret(TEST_SECRET),
            )
            .unwrap(),
        );

        // Lowest bcrypt cost keeps the tests fast
        let auth_service = Arc::new(AuthService::new(
            users.clone(),
            token_service,
            AuthServiceConfig::default().with_bcrypt_cost(4),
        ));

        Self {
            state: web::Data::new(AppState::new(auth_service)),
            users,
            tokens,
        }
    }

    /// Registers a user and opens one session for it
    pub async fn user_with_session(&self, username: &str, password: &str) -> TokenPair {
        self.state
            .auth_service
            .register(username, password)
            .await
            .unwrap();
        self.state
            .auth_service
            .login(username, password, None)
            .await
            .unwrap()
    }
}

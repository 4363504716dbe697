//! Authentication route handlers
//!
//! This module contains all authentication-related endpoints:
//! - Registration and password login
//! - Refresh token rotation
//! - Logout from every session

pub mod login;
pub mod logout;
pub mod refresh;
pub mod register;

use std::sync::Arc;

use authn_core::repositories::{TokenRepository, UserRepository};
use authn_core::services::AuthService;

/// Application state that holds shared services
pub struct AppState<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    pub auth_service: Arc<AuthService<U, T>>,
}

impl<U, T> AppState<U, T>
where
    U: UserRepository,
    T: TokenRepository,
{
    pub fn new(auth_service: Arc<AuthService<U, T>>) -> Self {
        Self { auth_service }
    }
}

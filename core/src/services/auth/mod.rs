//! Authentication service module
//!
//! This module provides username and password authentication:
//! - User registration with bcrypt password hashes
//! - Login, which issues a token pair
//! - Refresh and logout, delegated to the token service

mod config;
mod password;
mod service;


pub use config::AuthServiceConfig;
pub use password::{hash_password, verify_password};
pub use service::AuthService;

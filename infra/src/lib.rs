//! # Infrastructure Layer
//!
//! Concrete storage for the AuthN server, following Clean Architecture
//! principles: the core defines the repository traits, this crate implements
//! them over MySQL with SQLx.
//!
//! ## Architecture
//!
//! - **Database**: connection pool, schema bootstrap, and the MySQL
//!   `TokenRepository` and `UserRepository` implementations

/// Database module - MySQL implementations using SQLx
pub mod database;

pub use database::{
    ensure_schema, DatabasePool, MySqlTokenRepository, MySqlUserRepository, PoolStatistics,
};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

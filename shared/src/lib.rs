//! Shared configuration and response types for the AuthN server
//!
//! This crate provides functionality used across all server crates:
//! - Configuration types loaded from the environment
//! - The JSON error envelope and error codes

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, Environment, JwtConfig, LogFormat,
    LoggingConfig, ServerConfig, SessionConfig,
};
pub use errors::{error_codes, ErrorResponse};

//! Configuration module with business-specific sub-modules
//!
//! - `auth` - access token signing and refresh session lifetimes
//! - `database` - database connection and pool configuration
//! - `environment` - environment detection and logging configuration
//! - `server` - HTTP server and CORS configuration

pub mod auth;
pub mod database;
pub mod environment;
pub mod server;

use serde::{Deserialize, Serialize};

pub use auth::{AuthConfig, JwtConfig, SessionConfig};
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use server::{CorsConfig, ServerConfig};

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::development(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// A `.env` file is read first when present. Production refuses to start
    /// with the built-in development signing secret.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env();
        let auth = AuthConfig::from_env();

        if auth.jwt.is_using_default_secret() {
            if environment.is_production() {
                return Err("JWT_SECRET must be set in production".to_string());
            }
            tracing::warn!("JWT_SECRET not set, using the development signing secret");
        }

        let cors = if environment.is_production() {
            CorsConfig::from_env()
        } else {
            CorsConfig::development()
        };

        Ok(Self {
            environment,
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            auth,
            cors,
            logging: LoggingConfig::for_environment(environment),
        })
    }
}

use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use authn_api::{create_app, AppState};
use authn_core::services::{
    AuthService, AuthServiceConfig, TokenCleanupConfig, TokenCleanupService, TokenService,
    TokenServiceConfig,
};
use authn_infra::{ensure_schema, DatabasePool, MySqlTokenRepository, MySqlUserRepository};
use authn_shared::{AppConfig, LogFormat, LoggingConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;

    init_tracing(&config.logging);

    info!(environment = %config.environment, "Starting AuthN API Server");

    let database = DatabasePool::new(&config.database)
        .await
        .context("failed to connect to the database")?;
    ensure_schema(database.get_pool())
        .await
        .context("failed to create the database schema")?;
    info!(pool = %database.get_statistics(), "Database ready");

    let user_repository = Arc::new(MySqlUserRepository::new(database.get_pool().clone()));
    let token_repository = Arc::new(MySqlTokenRepository::new(database.get_pool().clone()));

    let token_service = Arc::new(
        TokenService::new(
            token_repository.clone(),
            user_repository.clone(),
            TokenServiceConfig::from_auth_config(&config.auth),
        )
        .context("failed to initialise the token service")?,
    );

    let auth_service = Arc::new(AuthService::new(
        user_repository,
        token_service,
        AuthServiceConfig::from_session_config(&config.auth.session),
    ));

    let cleanup = Arc::new(TokenCleanupService::new(
        token_repository,
        TokenCleanupConfig::from_session_config(&config.auth.session),
    ));
    cleanup.start_background_task();

    let app_state = web::Data::new(AppState::new(auth_service));
    let cors = config.cors.clone();
    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(app_state.clone(), &cors))
        .keep_alive(std::time::Duration::from_secs(config.server.keep_alive))
        .client_request_timeout(std::time::Duration::from_secs(config.server.request_timeout));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("failed to bind {}", bind_address))?
        .run()
        .await?;

    info!("Server stopped, closing database pool");
    database.close().await;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins over the configured default
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(logging.source_location)
        .with_line_number(logging.source_location);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

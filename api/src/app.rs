//! Application factory
//!
//! Builds the actix-web application around an already wired `AppState`.
//! The binary and the integration tests share this function.

use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::InternalError,
    http::StatusCode,
    web, App, Error, HttpResponse,
};
use tracing_actix_web::TracingLogger;

use crate::handlers::error_handler::ErrorResponseExt;
use crate::middleware::{auth::JwtAuth, cors::create_cors};
use crate::routes::auth::{
    login::login, logout::logout, refresh::refresh_token, register::register, AppState,
};
use crate::routes::backend::backend;

use authn_core::repositories::{TokenRepository, UserRepository};
use authn_shared::{error_codes, CorsConfig, ErrorResponse};

/// Create and configure the application with all dependencies
pub fn create_app<U, T>(
    app_state: web::Data<AppState<U, T>>,
    cors_config: &CorsConfig,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
>
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    // One signer per process, shared by every protected route
    let signer = Arc::new(app_state.auth_service.token_service().signer().clone());
    let jwt_auth = JwtAuth::new(signer);

    App::new()
        .app_data(app_state)
        .app_data(json_config())
        // Last wrap runs first, so the request span also covers CORS
        .wrap(create_cors(cors_config))
        .wrap(TracingLogger::default())
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(register::<U, T>))
                        .route("/login", web::post().to(login::<U, T>))
                        .route("/refresh", web::post().to(refresh_token::<U, T>))
                        .route(
                            "/logout",
                            web::post().to(logout::<U, T>).wrap(jwt_auth.clone()),
                        ),
                )
                .route("/backend", web::get().to(backend).wrap(jwt_auth)),
        )
        .default_service(web::route().to(not_found))
}

/// Malformed JSON bodies get the same envelope as every other error
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse::new(
            error_codes::BAD_REQUEST,
            format!("Invalid request body: {}", err),
        );
        let response = body.to_response(StatusCode::BAD_REQUEST);
        InternalError::from_response(err, response).into()
    })
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "authn-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    ErrorResponse::new(error_codes::NOT_FOUND, "The requested resource was not found")
        .to_response(StatusCode::NOT_FOUND)
}

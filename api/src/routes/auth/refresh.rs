use actix_web::{http::StatusCode, web, HttpResponse};

use crate::dto::auth::{RefreshTokenRequest, TokenResponse};
use crate::handlers::error_handler::{handle_domain_error, ErrorResponseExt};

use authn_core::repositories::{TokenRepository, UserRepository};
use authn_shared::{error_codes, ErrorResponse};

use super::AppState;

/// Handler for POST /api/v1/auth/refresh
///
/// Exchanges a refresh token for a new access token and a new refresh token.
/// The presented token is consumed; presenting it again revokes every session
/// of its owner.
///
/// # Request Body
///
/// ```json
/// {
///     "refresh_token": "string"
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: `refresh_token_required` when the token is missing
/// - 401 Unauthorized: `invalid_refresh_token` for unknown, reused, or expired tokens
/// - 503 Service Unavailable: Session store did not answer in time
pub async fn refresh_token<U, T>(
    state: web::Data<AppState<U, T>>,
    request: web::Json<RefreshTokenRequest>,
) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    let raw = request.refresh_token.trim();
    if raw.is_empty() {
        return ErrorResponse::new(error_codes::REFRESH_TOKEN_REQUIRED, "Refresh token is required")
            .to_response(StatusCode::BAD_REQUEST);
    }

    match state.auth_service.refresh(raw).await {
        Ok(pair) => HttpResponse::Ok().json(TokenResponse::from(pair)),
        Err(error) => handle_domain_error(error),
    }
}

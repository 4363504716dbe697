use actix_web::{web, HttpResponse};

use crate::dto::auth::LogoutResponse;
use crate::handlers::error_handler::handle_domain_error;
use crate::middleware::auth::AuthContext;

use authn_core::repositories::{TokenRepository, UserRepository};

use super::AppState;

/// Handler for POST /api/v1/auth/logout
///
/// Revokes every refresh session of the authenticated user. Access tokens
/// already handed out stay valid until they expire.
///
/// # Headers
///
/// ```text
/// Authorization: Bearer {access_token}
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "message": "Logged out successfully",
///     "revoked": 2
/// }
/// ```
pub async fn logout<U, T>(
    state: web::Data<AppState<U, T>>,
    auth: AuthContext,
) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    match state.auth_service.logout(auth.user_id).await {
        Ok(revoked) => HttpResponse::Ok().json(LogoutResponse {
            message: "Logged out successfully".to_string(),
            revoked,
        }),
        Err(error) => handle_domain_error(error),
    }
}

use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::dto::auth::{RegisterRequest, RegisterResponse};
use crate::handlers::error_handler::{handle_domain_error, handle_validation_errors};

use authn_core::repositories::{TokenRepository, UserRepository};

use super::AppState;

/// Handler for POST /api/v1/auth/register
///
/// # Request Body
///
/// ```json
/// {
///     "username": "alice",
///     "password": "correct horse battery staple"
/// }
/// ```
///
/// # Response
///
/// ## Success (201 Created)
/// ```json
/// {
///     "user_id": 1,
///     "username": "alice"
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Empty or oversized username or password
/// - 409 Conflict: Username already taken
pub async fn register<U, T>(
    state: web::Data<AppState<U, T>>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_validation_errors(errors);
    }

    match state
        .auth_service
        .register(&request.username, &request.password)
        .await
    {
        Ok(user) => HttpResponse::Created().json(RegisterResponse::from(user)),
        Err(error) => handle_domain_error(error),
    }
}

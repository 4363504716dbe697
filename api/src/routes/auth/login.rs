use actix_web::{http::header::USER_AGENT, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::dto::auth::{LoginRequest, TokenResponse};
use crate::handlers::error_handler::{handle_domain_error, handle_validation_errors};

use authn_core::repositories::{TokenRepository, UserRepository};

use super::AppState;

/// Longest device label kept with a session
const MAX_DEVICE_INFO_LEN: usize = 255;

/// Handler for POST /api/v1/auth/login
///
/// Authenticates with username and password and opens a new refresh session.
///
/// # Request Body
///
/// ```json
/// {
///     "username": "alice",
///     "password": "secret",
///     "device_info": "iPhone 15"
/// }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "user_id": 1,
///     "access_token": "eyJ...",
///     "access_expires_in": 900,
///     "refresh_token": "9f86d0...",
///     "refresh_expires_in": 86400
/// }
/// ```
///
/// ## Errors
/// - 400 Bad Request: Empty or oversized fields
/// - 401 Unauthorized: Unknown user or wrong password
/// - 503 Service Unavailable: Session store did not answer in time
pub async fn login<U, T>(
    req: HttpRequest,
    state: web::Data<AppState<U, T>>,
    request: web::Json<LoginRequest>,
) -> HttpResponse
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_validation_errors(errors);
    }

    let request = request.into_inner();
    let device_info = device_info(&req, request.device_info);

    match state
        .auth_service
        .login(&request.username, &request.password, device_info)
        .await
    {
        Ok(pair) => HttpResponse::Ok().json(TokenResponse::from(pair)),
        Err(error) => handle_domain_error(error),
    }
}

/// Body label first, then the User-Agent header
fn device_info(req: &HttpRequest, from_body: Option<String>) -> Option<String> {
    from_body
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .or_else(|| {
            req.headers()
                .get(USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(|agent| agent.trim().chars().take(MAX_DEVICE_INFO_LEN).collect::<String>())
                .filter(|agent| !agent.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_device_info_prefers_body() {
        let req = TestRequest::default()
            .insert_header((USER_AGENT, "curl/8.0"))
            .to_http_request();

        assert_eq!(
            device_info(&req, Some("iPhone".to_string())),
            Some("iPhone".to_string())
        );
        assert_eq!(device_info(&req, Some("  ".to_string())), Some("curl/8.0".to_string()));
        assert_eq!(device_info(&req, None), Some("curl/8.0".to_string()));
    }

    #[test]
    fn test_device_info_absent() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(device_info(&req, None), None);
    }

    #[test]
    fn test_device_info_truncates_user_agent() {
        let agent = "a".repeat(400);
        let req = TestRequest::default()
            .insert_header((USER_AGENT, agent.as_str()))
            .to_http_request();

        let label = device_info(&req, None).unwrap();
        assert_eq!(label.len(), MAX_DEVICE_INFO_LEN);
    }
}

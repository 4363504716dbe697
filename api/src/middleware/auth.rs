//! Bearer token middleware for protecting API endpoints.
//!
//! The middleware reads the access token from the Authorization header,
//! verifies it with the claims signer, and injects the caller's identity into
//! the request. Every verification failure produces the same 401 body, so a
//! client cannot tell an expired token from a forged one.

use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};

use authn_core::{domain::entities::token::Claims, services::ClaimsSigner};
use authn_shared::{error_codes, ErrorResponse};

/// User authentication context injected into requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// User ID taken from the `sub` claim
    pub user_id: i64,
    /// Username at issuance, may be empty
    pub username: String,
}

impl AuthContext {
    /// Creates a new authentication context from verified claims
    ///
    /// Returns `None` when the subject is not a user id.
    pub fn from_claims(claims: Claims) -> Option<Self> {
        let user_id = claims.user_id().ok()?;
        Some(Self {
            user_id,
            username: claims.username,
        })
    }
}

/// Bearer token middleware factory
#[derive(Clone)]
pub struct JwtAuth {
    signer: Arc<ClaimsSigner>,
}

impl JwtAuth {
    /// Creates the middleware around the process-wide signer
    pub fn new(signer: Arc<ClaimsSigner>) -> Self {
        Self { signer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            signer: Arc::clone(&self.signer),
        }))
    }
}

/// Bearer token middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    signer: Arc<ClaimsSigner>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let signer = Arc::clone(&self.signer);

        Box::pin(async move {
            let token = match extract_bearer_token(&req) {
                Some(token) => token,
                None => return Ok(req.into_response(authorization_required_response())),
            };

            let auth_context = match signer.verify(&token) {
                Ok(claims) => match AuthContext::from_claims(claims) {
                    Some(context) => context,
                    None => return Ok(req.into_response(invalid_token_response())),
                },
                Err(e) => {
                    // Subtype stays in the logs only
                    tracing::debug!(error = %e, path = %req.path(), "Access token rejected");
                    return Ok(req.into_response(invalid_token_response()));
                }
            };

            req.extensions_mut().insert(auth_context);

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_boxed_body)
        })
    }
}

/// Extracts Bearer token from Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

fn invalid_token_response() -> HttpResponse {
    unauthorized(error_codes::INVALID_TOKEN, "Token is invalid or expired")
}

fn authorization_required_response() -> HttpResponse {
    unauthorized(
        error_codes::AUTHORIZATION_REQUIRED,
        "Missing or invalid Authorization header",
    )
}

fn unauthorized(code: &str, message: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorResponse::new(code, message))
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| {
                InternalError::from_response(
                    "Authentication required",
                    authorization_required_response(),
                )
                .into()
            });

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        use actix_web::test;

        let req = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer test_token_123"))
            .to_srv_request();

        assert_eq!(extract_bearer_token(&req), Some("test_token_123".to_string()));

        let req_no_bearer = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "test_token_123"))
            .to_srv_request();

        assert_eq!(extract_bearer_token(&req_no_bearer), None);

        let req_empty = test::TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer "))
            .to_srv_request();

        assert_eq!(extract_bearer_token(&req_empty), None);

        let req_no_header = test::TestRequest::default().to_srv_request();
        assert_eq!(extract_bearer_token(&req_no_header), None);
    }

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::new(42, "alice", 60);
        let context = AuthContext::from_claims(claims).unwrap();
        assert_eq!(context.user_id, 42);
        assert_eq!(context.username, "alice");

        let mut bad = Claims::new(1, "bob", 60);
        bad.sub = "not-a-number".to_string();
        assert!(AuthContext::from_claims(bad).is_none());
    }
}

//! Mapping from domain errors to HTTP responses
//!
//! Token rejections are collapsed into one body per token kind. The specific
//! reason is logged and never sent to the client.

use actix_web::{http::StatusCode, HttpResponse};
use validator::ValidationErrors;

use authn_core::errors::{AuthError, DomainError};
use authn_shared::{error_codes, ErrorResponse};

// Extension trait for ErrorResponse to add actix-web specific methods
pub trait ErrorResponseExt {
    fn to_response(&self, status: StatusCode) -> HttpResponse;
}

impl ErrorResponseExt for ErrorResponse {
    fn to_response(&self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

/// Handle domain errors and convert them to appropriate HTTP responses
pub fn handle_domain_error(error: DomainError) -> HttpResponse {
    let (status, code, message) = classify(&error);

    if status.is_server_error() {
        tracing::error!(error = %error, status = status.as_u16(), "Request failed");
    } else {
        tracing::debug!(error = %error, status = status.as_u16(), "Request rejected");
    }

    ErrorResponse::new(code, message).to_response(status)
}

/// Request body failed `validator` checks
pub fn handle_validation_errors(errors: ValidationErrors) -> HttpResponse {
    let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
    fields.sort_unstable();
    tracing::debug!(fields = ?fields, "Request validation failed");

    ErrorResponse::new(
        error_codes::VALIDATION_ERROR,
        format!("Invalid fields: {}", fields.join(", ")),
    )
    .to_response(StatusCode::BAD_REQUEST)
}

fn classify(error: &DomainError) -> (StatusCode, &'static str, String) {
    if error.is_refresh_rejection() {
        return (
            StatusCode::UNAUTHORIZED,
            error_codes::INVALID_REFRESH_TOKEN,
            "Refresh token is invalid or expired".to_string(),
        );
    }

    if error.is_access_rejection() {
        return (
            StatusCode::UNAUTHORIZED,
            error_codes::INVALID_TOKEN,
            "Token is invalid or expired".to_string(),
        );
    }

    match error {
        DomainError::Auth(AuthError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            error_codes::INVALID_CREDENTIALS,
            "Invalid username or password".to_string(),
        ),
        DomainError::Auth(AuthError::UserAlreadyExists) => (
            StatusCode::CONFLICT,
            error_codes::USER_ALREADY_EXISTS,
            "User already exists".to_string(),
        ),
        DomainError::Auth(AuthError::UserNotFound) | DomainError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            "The requested resource was not found".to_string(),
        ),
        DomainError::ValidationErr(e) => (
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            e.to_string(),
        ),
        DomainError::Validation { message } => (
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            message.clone(),
        ),
        DomainError::StorageUnavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable, please retry".to_string(),
        ),
        DomainError::Token(_) | DomainError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "An internal error occurred".to_string(),
        ),
    }
}

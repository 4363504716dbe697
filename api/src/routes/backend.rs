//! Sample protected resource

use actix_web::HttpResponse;

use crate::dto::auth::BackendResponse;
use crate::middleware::auth::AuthContext;

/// Handler for GET /api/v1/backend
pub async fn backend(auth: AuthContext) -> HttpResponse {
    let name = if auth.username.is_empty() {
        "user"
    } else {
        auth.username.as_str()
    };

    HttpResponse::Ok().json(BackendResponse {
        message: format!("Hello {}, from backend!", name),
    })
}

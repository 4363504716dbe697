//! Integration tests for the bearer token gate

mod common;

use actix_web::{http::header, test};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use authn_api::create_app;
use authn_core::services::ClaimsSigner;
use authn_shared::CorsConfig;

use common::{TestContext, TEST_SECRET};

fn forge(algorithm: Algorithm, secret: &str, claims: Value) -> String {
    encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn backend_request(token: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri("/api/v1/backend")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
}

#[actix_web::test]
async fn test_backend_greets_authenticated_user() {
    let ctx = TestContext::new();
    let pair = ctx.user_with_session("alice", "pw").await;
    let app = test::init_service(create_app(ctx.state.clone(), &CorsConfig::development())).await;

    let resp = test::call_service(&app, backend_request(&pair.access_token).to_request()).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Hello alice, from backend!");
}

#[actix_web::test]
async fn test_backend_falls_back_to_generic_name() {
    let ctx = TestContext::new();
    let token = ClaimsSigner::new(TEST_SECRET)
        .unwrap()
        .issue(7, "", 60)
        .unwrap();
    let app = test::init_service(create_app(ctx.state.clone(), &CorsConfig::development())).await;

    let resp = test::call_service(&app, backend_request(&token).to_request()).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Hello user, from backend!");
}

#[actix_web::test]
async fn test_backend_requires_authorization_header() {
    let ctx = TestContext::new();
    let app = test::init_service(create_app(ctx.state.clone(), &CorsConfig::development())).await;

    for value in [None, Some("Basic dXNlcjpwdw=="), Some("Bearer ")] {
        let mut req = test::TestRequest::get().uri("/api/v1/backend");
        if let Some(value) = value {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        let resp = test::call_service(&app, req.to_request()).await;

        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "authorization_required");
    }
}

#[actix_web::test]
async fn test_every_bad_token_gets_the_same_rejection() {
    let ctx = TestContext::new();
    let app = test::init_service(create_app(ctx.state.clone(), &CorsConfig::development())).await;

    let now = Utc::now().timestamp();
    let valid_claims = json!({ "sub": "1", "username": "mallory", "iat": now, "exp": now + 600 });

    let bad_tokens = vec![
        // Expired
        forge(
            Algorithm::HS256,
            TEST_SECRET,
            json!({ "sub": "1", "username": "mallory", "iat": now - 600, "exp": now - 60 }),
        ),
        // Signed with another key
        forge(Algorithm::HS256, "some-other-secret", valid_claims.clone()),
        // Right key, wrong algorithm
        forge(Algorithm::HS512, TEST_SECRET, valid_claims.clone()),
        // Missing subject
        forge(
            Algorithm::HS256,
            TEST_SECRET,
            json!({ "username": "mallory", "iat": now, "exp": now + 600 }),
        ),
        // Subject is not a user id
        forge(
            Algorithm::HS256,
            TEST_SECRET,
            json!({ "sub": "admin", "iat": now, "exp": now + 600 }),
        ),
        "not.a.jwt".to_string(),
        "garbage".to_string(),
    ];

    for token in bad_tokens {
        let resp = test::call_service(&app, backend_request(&token).to_request()).await;
        assert_eq!(resp.status(), 401, "token {} should be rejected", token);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_token");
        assert_eq!(body["message"], "Token is invalid or expired");
    }
}

#[actix_web::test]
async fn test_access_token_survives_logout_until_expiry() {
    let ctx = TestContext::new();
    let pair = ctx.user_with_session("bob", "pw").await;
    let app = test::init_service(create_app(ctx.state.clone(), &CorsConfig::development())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", pair.access_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // Access tokens are stateless; only the refresh sessions were revoked
    let resp = test::call_service(&app, backend_request(&pair.access_token).to_request()).await;
    assert_eq!(resp.status(), 200);
}

/// HTTP tests for registration, login and token refresh

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestContext;
use serde_json::json;
use teamboard_shared::models::user::{AuthProvider, CreateUser};
use tower::Service as _;

const PASSWORD: &str = "Passw0rdOk";

async fn register_dana(ctx: &TestContext) -> serde_json::Value {
    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "Dana@Example.com",
                "password": PASSWORD,
                "name": "Dana",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "register: {body}");
    body
}

#[tokio::test]
async fn test_register_then_duplicate_is_409() {
    let ctx = TestContext::new().unwrap();

    let body = register_dana(&ctx).await;
    assert_eq!(body["email"], "dana@example.com");
    assert_eq!(body["name"], "Dana");
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "dana@example.com",
                "password": PASSWORD,
                "name": "Dana Again",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let ctx = TestContext::new().unwrap();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "erin@example.com",
                "password": "alllowercase1",
                "name": "Erin",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({
                "email": "erin",
                "password": PASSWORD,
                "name": "Erin",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_and_refresh() {
    let ctx = TestContext::new().unwrap();
    register_dana(&ctx).await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "dana@example.com", "password": "Wr0ngPassword" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "DANA@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "login: {body}");
    let access = body["accessToken"].as_str().unwrap().to_string();
    let refresh = body["refreshToken"].as_str().unwrap().to_string();

    // An access token is not accepted where a refresh token is expected
    let (status, _) = ctx
        .send(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": access })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .send(
            Method::POST,
            "/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": refresh })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let renewed = body["accessToken"].as_str().unwrap();

    // The renewed token opens the protected routes
    let response = ctx
        .app
        .clone()
        .call(
            Request::builder()
                .method(Method::POST)
                .uri("/v1/projects")
                .header(header::AUTHORIZATION, format!("Bearer {renewed}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "name": "Gemini" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_login_unknown_and_google_accounts_are_401() {
    let ctx = TestContext::new().unwrap();
    ctx.store
        .insert_user(CreateUser {
            provider: AuthProvider::Google,
            ..CreateUser::local("gus@example.com", "Gus")
        })
        .unwrap();

    for email in ["nobody@example.com", "gus@example.com"] {
        let (status, _) = ctx
            .send(
                Method::POST,
                "/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{email}");
    }
}

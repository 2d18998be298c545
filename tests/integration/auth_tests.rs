//! Login and token handling tests

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rstest::rstest;
use serde_json::json;

use complaint_tracker::{middleware::Claims, models::UserRole};

use crate::common::{TestApp, TEST_PASSWORD};

#[tokio::test]
async fn test_login_with_json_returns_bearer_token() {
    let app = TestApp::new().await;
    app.seed_regular_user().await;

    let response = app
        .post_json(
            "/users/token",
            json!({ "username": "alice", "password": TEST_PASSWORD }),
        )
        .await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["token_type"], "bearer");
    let token = json["access_token"].as_str().unwrap();

    let me = app.get_auth("/users/me", token).await;
    me.assert_ok();
    let me: serde_json::Value = me.json();
    assert_eq!(me["username"], "alice");
}

#[tokio::test]
async fn test_login_with_form_body() {
    let app = TestApp::new().await;
    app.seed_regular_user().await;

    let response = app
        .post_form(
            "/users/token",
            &format!("username=alice&password={}", TEST_PASSWORD),
        )
        .await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert!(json["access_token"].as_str().is_some());
}

#[tokio::test]
async fn test_login_records_last_login() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    assert!(alice.user.last_login.is_none());

    app.post_json(
        "/users/token",
        json!({ "username": "alice", "password": TEST_PASSWORD }),
    )
    .await
    .assert_ok();

    let me: serde_json::Value = app.get_auth("/users/me", &alice.token).await.json();
    assert!(!me["last_login"].is_null());
}

#[rstest]
#[case("alice", "wrong-password")]
#[case("nobody", "password123")]
#[tokio::test]
async fn test_login_rejects_bad_credentials(#[case] username: &str, #[case] password: &str) {
    let app = TestApp::new().await;
    app.seed_regular_user().await;

    let response = app
        .post_json(
            "/users/token",
            json!({ "username": username, "password": password }),
        )
        .await;

    response.assert_unauthorized();
    assert_eq!(response.error_kind(), "unauthorized");
}

#[tokio::test]
async fn test_login_rejects_inactive_user() {
    let app = TestApp::new().await;
    let admin = app.seed_admin().await;
    let alice = app.seed_regular_user().await;

    app.post_auth(
        &format!("/admin/users/{}/toggle-status", alice.id()),
        &admin.token,
    )
    .await
    .assert_ok();

    app.post_json(
        "/users/token",
        json!({ "username": "alice", "password": TEST_PASSWORD }),
    )
    .await
    .assert_forbidden();

    // Existing tokens stop working as well
    app.get_auth("/users/me", &alice.token)
        .await
        .assert_forbidden();
}

#[tokio::test]
async fn test_login_with_missing_fields_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .post_json("/users/token", json!({ "username": "alice" }))
        .await;
    response.assert_unprocessable();
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = TestApp::new().await;

    let response = app.get("/complaints").await;
    response.assert_unauthorized();
    assert_eq!(response.error_kind(), "unauthorized");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::new().await;
    app.get_auth("/complaints", "not-a-jwt")
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    let now = Utc::now();
    let claims = Claims {
        sub: alice.user.username.clone(),
        uid: alice.id(),
        role: UserRole::User,
        iat: (now - Duration::hours(2)).timestamp(),
        exp: (now - Duration::hours(1)).timestamp(),
        nbf: (now - Duration::hours(2)).timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.state.config.auth.jwt_secret.as_bytes()),
    )
    .unwrap();

    app.get_auth("/users/me", &token).await.assert_unauthorized();
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let app = TestApp::new().await;
    let mut ghost = app.seed_regular_user().await.user;
    ghost.username = "ghost".to_string();
    let token = app.token_for(&ghost);

    app.get_auth("/users/me", &token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_never_exposes_password_hash() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    let response = app.get_auth("/users/me", &alice.token).await;
    response.assert_ok();
    assert!(!response.text().contains("password"));
    assert!(!response.text().contains("argon2"));
}

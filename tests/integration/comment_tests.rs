//! Comment endpoint tests

use serde_json::json;

use complaint_tracker::models::UserRole;

use crate::common::TestApp;

#[tokio::test]
async fn test_create_and_list_comments_newest_first() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let bob = app.seed_user("bob", UserRole::User).await;
    let complaint = app
        .create_complaint(&alice.token, json!({ "title": "t", "description": "d" }))
        .await;
    let uri = format!("/complaints/{}/comments", complaint["id"]);

    let response = app
        .post_json_auth(&uri, json!({ "content": "First!" }), &alice.token)
        .await;
    response.assert_ok();
    let first: serde_json::Value = response.json();
    assert_eq!(first["content"], "First!");
    assert_eq!(first["user_id"], alice.id());
    assert_eq!(first["complaint_id"], complaint["id"]);
    assert_eq!(first["user"]["username"], "alice");

    app.post_json_auth(&uri, json!({ "content": "Second" }), &bob.token)
        .await
        .assert_ok();

    let comments: Vec<serde_json::Value> = app.get_auth(&uri, &alice.token).await.json();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["content"], "Second");
    assert_eq!(comments[0]["user"]["username"], "bob");
    assert_eq!(comments[1]["content"], "First!");
    assert!(comments[0]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_comment_on_missing_complaint_is_not_found() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    app.post_json_auth(
        "/complaints/999/comments",
        json!({ "content": "hello" }),
        &alice.token,
    )
    .await
    .assert_not_found();
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let complaint = app
        .create_complaint(&alice.token, json!({ "title": "t", "description": "d" }))
        .await;

    app.post_json_auth(
        &format!("/complaints/{}/comments", complaint["id"]),
        json!({ "content": "  " }),
        &alice.token,
    )
    .await
    .assert_unprocessable();
}

#[tokio::test]
async fn test_comments_for_unknown_complaint_is_empty() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    let response = app.get_auth("/complaints/999/comments", &alice.token).await;
    response.assert_ok();
    let comments: Vec<serde_json::Value> = response.json();
    assert!(comments.is_empty());
}

//! Public endpoint tests

use crate::common::TestApp;

#[tokio::test]
async fn test_root_returns_welcome_message() {
    let app = TestApp::new().await;
    let response = app.get("/").await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert!(json["message"].as_str().unwrap().contains("Complaint Tracker"));
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;

    response.assert_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_readiness_probe() {
    let app = TestApp::new().await;
    let response = app.get("/health/ready").await;

    response.assert_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["database"], "healthy");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    app.get("/does-not-exist").await.assert_not_found();
}

#[tokio::test]
async fn test_schema_has_required_tables() {
    let app = TestApp::new().await;
    let missing = complaint_tracker::db::migrations::missing_tables(&app.state.db)
        .await
        .unwrap();
    assert!(missing.is_empty(), "missing tables: {:?}", missing);
}

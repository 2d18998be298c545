//! Complaint CRUD, filtering and audit tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use rstest::rstest;
use serde_json::json;
use tower::ServiceExt;

use complaint_tracker::models::UserRole;

use crate::common::{tag_ids, test_config, TestApp};

#[tokio::test]
async fn test_create_complaint_defaults() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    let complaint = app
        .create_complaint(
            &alice.token,
            json!({ "title": "Leaky faucet", "description": "Kitchen sink" }),
        )
        .await;

    assert_eq!(complaint["status"], "open");
    assert_eq!(complaint["priority"], "medium");
    assert_eq!(complaint["created_by_id"], alice.id());
    assert!(complaint["assigned_to_id"].is_null());
    assert!(complaint["updated_at"].is_null());
    assert_eq!(complaint["tags"], json!([]));
}

#[rstest]
#[case("low")]
#[case("high")]
#[case("critical")]
#[tokio::test]
async fn test_create_complaint_is_always_open(#[case] priority: &str) {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    let complaint = app
        .create_complaint(
            &alice.token,
            json!({ "title": "t", "description": "d", "priority": priority, "status": "resolved" }),
        )
        .await;

    assert_eq!(complaint["status"], "open");
    assert_eq!(complaint["priority"], priority);
    assert_eq!(complaint["created_by_id"], alice.id());
}

#[tokio::test]
async fn test_create_complaint_with_tags_skips_unknown_and_duplicates() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let plumbing = app.create_tag(&alice.token, "plumbing").await;

    let complaint = app
        .create_complaint(
            &alice.token,
            json!({
                "title": "Leak",
                "description": "Dripping",
                "tag_ids": [plumbing, plumbing, 9999]
            }),
        )
        .await;

    assert_eq!(tag_ids(&complaint), vec![plumbing]);
}

#[rstest]
#[case(json!({ "title": "", "description": "d" }))]
#[case(json!({ "title": "   ", "description": "d" }))]
#[case(json!({ "title": "t", "description": "" }))]
#[case(json!({ "title": "t", "description": "d", "priority": "urgent" }))]
#[case(json!({ "description": "d" }))]
#[tokio::test]
async fn test_create_complaint_rejects_invalid_payload(#[case] body: serde_json::Value) {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    let response = app.post_json_auth("/complaints", body, &alice.token).await;
    response.assert_unprocessable();
    assert_eq!(response.error_kind(), "validation_error");
}

#[tokio::test]
async fn test_get_complaint_and_missing_id() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let created = app
        .create_complaint(&alice.token, json!({ "title": "t", "description": "d" }))
        .await;

    let response = app
        .get_auth(&format!("/complaints/{}", created["id"]), &alice.token)
        .await;
    response.assert_ok();
    let fetched: serde_json::Value = response.json();
    assert_eq!(fetched["title"], "t");

    app.get_auth("/complaints/424242", &alice.token)
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    app.get_auth("/complaints/abc", &alice.token)
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    for title in ["first", "second", "third"] {
        app.create_complaint(&alice.token, json!({ "title": title, "description": "d" }))
            .await;
    }

    let list: Vec<serde_json::Value> = app.get_auth("/complaints", &alice.token).await.json();
    let titles: Vec<&str> = list.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    let a = app
        .create_complaint(&alice.token, json!({ "title": "a", "description": "d" }))
        .await;
    app.create_complaint(&alice.token, json!({ "title": "b", "description": "d" }))
        .await;
    let c = app
        .create_complaint(&alice.token, json!({ "title": "c", "description": "d" }))
        .await;

    for complaint in [&a, &c] {
        app.put_json_auth(
            &format!("/complaints/{}", complaint["id"]),
            json!({ "status": "resolved" }),
            &alice.token,
        )
        .await
        .assert_ok();
    }

    let list: Vec<serde_json::Value> = app
        .get_auth("/complaints?status=resolved", &alice.token)
        .await
        .json();
    let titles: Vec<&str> = list.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["c", "a"]);
    assert!(list.iter().all(|c| c["status"] == "resolved"));
}

#[tokio::test]
async fn test_list_filters_by_priority_and_tag() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let tag = app.create_tag(&alice.token, "electrical").await;

    app.create_complaint(
        &alice.token,
        json!({ "title": "sparks", "description": "d", "priority": "critical", "tag_ids": [tag] }),
    )
    .await;
    app.create_complaint(
        &alice.token,
        json!({ "title": "flicker", "description": "d", "priority": "low", "tag_ids": [tag] }),
    )
    .await;
    app.create_complaint(
        &alice.token,
        json!({ "title": "noise", "description": "d", "priority": "critical" }),
    )
    .await;

    let critical: Vec<serde_json::Value> = app
        .get_auth("/complaints?priority=critical", &alice.token)
        .await
        .json();
    assert_eq!(critical.len(), 2);

    let tagged: Vec<serde_json::Value> = app
        .get_auth(&format!("/complaints?tag_id={}", tag), &alice.token)
        .await
        .json();
    let titles: Vec<&str> = tagged.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["flicker", "sparks"]);

    let both: Vec<serde_json::Value> = app
        .get_auth(
            &format!("/complaints?tag_id={}&priority=critical", tag),
            &alice.token,
        )
        .await
        .json();
    assert_eq!(both.len(), 1);
    assert_eq!(both[0]["title"], "sparks");
}

#[tokio::test]
async fn test_list_rejects_unknown_status_filter() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    app.get_auth("/complaints?status=closed", &alice.token)
        .await
        .assert_unprocessable();
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_literal() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    app.create_complaint(
        &alice.token,
        json!({ "title": "Heating broken", "description": "Radiator cold" }),
    )
    .await;
    app.create_complaint(
        &alice.token,
        json!({ "title": "Discount", "description": "Only 50% applied" }),
    )
    .await;
    app.create_complaint(
        &alice.token,
        json!({ "title": "Other", "description": "Nothing relevant" }),
    )
    .await;

    let by_description: Vec<serde_json::Value> = app
        .get_auth("/complaints?search=radiator", &alice.token)
        .await
        .json();
    assert_eq!(by_description.len(), 1);
    assert_eq!(by_description[0]["title"], "Heating broken");

    // "%" is matched literally, not as a wildcard
    let percent: Vec<serde_json::Value> = app
        .get_auth("/complaints?search=50%25", &alice.token)
        .await
        .json();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0]["title"], "Discount");

    let wildcard: Vec<serde_json::Value> = app
        .get_auth("/complaints?search=%25", &alice.token)
        .await
        .json();
    assert_eq!(wildcard.len(), 1);
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    app.create_complaint(
        &alice.token,
        json!({ "title": "Problème à l'école", "description": "Chauffage en panne" }),
    )
    .await;
    app.create_complaint(
        &alice.token,
        json!({ "title": "Other", "description": "Nothing relevant" }),
    )
    .await;

    for search in ["%C3%A9cole", "%C3%89COLE", "PROBL%C3%88ME"] {
        let found: Vec<serde_json::Value> = app
            .get_auth(&format!("/complaints?search={}", search), &alice.token)
            .await
            .json();
        assert_eq!(found.len(), 1, "search={}", search);
        assert_eq!(found[0]["title"], "Problème à l'école");
    }

    // An updated title is searchable under its new text only
    let id = app
        .get_auth("/complaints?search=%C3%A9cole", &alice.token)
        .await
        .json::<Vec<serde_json::Value>>()[0]["id"]
        .clone();
    app.put_json_auth(
        &format!("/complaints/{}", id),
        json!({ "title": "Fenêtre cassée" }),
        &alice.token,
    )
    .await
    .assert_ok();

    let renamed: Vec<serde_json::Value> = app
        .get_auth("/complaints?search=FEN%C3%8ATRE", &alice.token)
        .await
        .json();
    assert_eq!(renamed.len(), 1);
    let old: Vec<serde_json::Value> = app
        .get_auth("/complaints?search=%C3%89COLE", &alice.token)
        .await
        .json();
    assert!(old.is_empty());
}

#[tokio::test]
async fn test_large_page_loads_tags_for_every_complaint() {
    // More rows than SQLite accepts as bound parameters in one statement
    const COUNT: i64 = 33_000;

    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let tag = app.create_tag(&alice.token, "bulk").await;
    let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);

    sqlx::query(
        r#"
        WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < ?)
        INSERT INTO complaints
            (title, title_folded, description, description_folded, status, priority, created_by_id, created_at)
        SELECT 'bulk ' || n, 'bulk ' || n, 'd', 'd', 'open', 'low', ?, ? FROM seq
        "#,
    )
    .bind(COUNT)
    .bind(alice.id())
    .bind(&now)
    .execute(&app.state.db)
    .await
    .unwrap();
    sqlx::query("INSERT INTO complaint_tags (complaint_id, tag_id) SELECT id, ? FROM complaints")
        .bind(tag)
        .execute(&app.state.db)
        .await
        .unwrap();

    let response = app
        .get_auth("/complaints?limit=40000", &alice.token)
        .await;
    response.assert_ok();
    let complaints: Vec<serde_json::Value> = response.json();
    assert_eq!(complaints.len() as i64, COUNT);
    assert!(complaints.iter().all(|c| tag_ids(c) == vec![tag]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_to_one_complaint_all_succeed() {
    const WRITERS: usize = 40;

    let mut config = test_config();
    config.database.max_connections = 8;
    let app = TestApp::with_config(config).await;
    let alice = app.seed_regular_user().await;
    let complaint = app
        .create_complaint(&alice.token, json!({ "title": "t", "description": "d" }))
        .await;
    let uri = format!("/complaints/{}", complaint["id"]);

    let mut handles = Vec::with_capacity(WRITERS);
    for i in 0..WRITERS {
        let router = app.router.clone();
        let request = Request::builder()
            .method("PUT")
            .uri(&uri)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", alice.token))
            .body(Body::from(json!({ "title": format!("title {}", i) }).to_string()))
            .unwrap();
        handles.push(tokio::spawn(async move {
            router.oneshot(request).await.unwrap().status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let logs: Vec<serde_json::Value> = app
        .get_auth(&format!("{}/audit-logs", uri), &alice.token)
        .await
        .json();
    assert_eq!(logs.len(), WRITERS);
}

#[tokio::test]
async fn test_list_pagination() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    for i in 0..5 {
        app.create_complaint(
            &alice.token,
            json!({ "title": format!("c{}", i), "description": "d" }),
        )
        .await;
    }

    let page: Vec<serde_json::Value> = app
        .get_auth("/complaints?skip=1&limit=2", &alice.token)
        .await
        .json();
    let titles: Vec<&str> = page.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["c3", "c2"]);
}

#[tokio::test]
async fn test_update_fields_and_assignee() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let bob = app.seed_user("bob", UserRole::User).await;
    let created = app
        .create_complaint(&alice.token, json!({ "title": "t", "description": "d" }))
        .await;
    let uri = format!("/complaints/{}", created["id"]);

    let response = app
        .put_json_auth(
            &uri,
            json!({ "status": "in_progress", "priority": "high", "assigned_to_id": bob.id() }),
            &alice.token,
        )
        .await;
    response.assert_ok();
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["priority"], "high");
    assert_eq!(updated["assigned_to_id"], bob.id());
    assert_eq!(updated["title"], "t");
    assert!(!updated["updated_at"].is_null());

    // Absent key leaves the assignee alone
    let kept: serde_json::Value = app
        .put_json_auth(&uri, json!({ "title": "renamed" }), &alice.token)
        .await
        .json();
    assert_eq!(kept["assigned_to_id"], bob.id());

    // Explicit null clears it
    let cleared: serde_json::Value = app
        .put_json_auth(&uri, json!({ "assigned_to_id": null }), &alice.token)
        .await
        .json();
    assert!(cleared["assigned_to_id"].is_null());
    assert_eq!(cleared["title"], "renamed");
}

#[tokio::test]
async fn test_update_with_unknown_assignee_is_bad_request() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let created = app
        .create_complaint(&alice.token, json!({ "title": "t", "description": "d" }))
        .await;

    app.put_json_auth(
        &format!("/complaints/{}", created["id"]),
        json!({ "assigned_to_id": 999 }),
        &alice.token,
    )
    .await
    .assert_bad_request();
}

#[tokio::test]
async fn test_update_missing_complaint_is_not_found() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    app.put_json_auth("/complaints/31337", json!({ "title": "x" }), &alice.token)
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_update_replaces_tag_set() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let a = app.create_tag(&alice.token, "a").await;
    let b = app.create_tag(&alice.token, "b").await;
    let c = app.create_tag(&alice.token, "c").await;

    let created = app
        .create_complaint(
            &alice.token,
            json!({ "title": "t", "description": "d", "tag_ids": [a, b] }),
        )
        .await;
    assert_eq!(tag_ids(&created), vec![a, b]);

    let updated: serde_json::Value = app
        .put_json_auth(
            &format!("/complaints/{}", created["id"]),
            json!({ "tag_ids": [b, c] }),
            &alice.token,
        )
        .await
        .json();
    assert_eq!(tag_ids(&updated), vec![b, c]);

    // Omitting tag_ids keeps the current set
    let untouched: serde_json::Value = app
        .put_json_auth(
            &format!("/complaints/{}", created["id"]),
            json!({ "priority": "low" }),
            &alice.token,
        )
        .await
        .json();
    assert_eq!(tag_ids(&untouched), vec![b, c]);

    // An empty list clears them
    let cleared: serde_json::Value = app
        .put_json_auth(
            &format!("/complaints/{}", created["id"]),
            json!({ "tag_ids": [] }),
            &alice.token,
        )
        .await
        .json();
    assert!(tag_ids(&cleared).is_empty());
}

#[tokio::test]
async fn test_every_update_appends_one_audit_entry() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;
    let created = app
        .create_complaint(&alice.token, json!({ "title": "t", "description": "d" }))
        .await;
    let id = created["id"].as_i64().unwrap();

    let logs: Vec<serde_json::Value> = app
        .get_auth(&format!("/complaints/{}/audit-logs", id), &alice.token)
        .await
        .json();
    assert!(logs.is_empty());

    app.put_json_auth(&format!("/complaints/{}", id), json!({}), &alice.token)
        .await
        .assert_ok();

    let logs: Vec<serde_json::Value> = app
        .get_auth(&format!("/complaints/{}/audit-logs", id), &alice.token)
        .await
        .json();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["change_description"], "Updated: ");
    assert_eq!(logs[0]["changed_by_id"], alice.id());

    app.put_json_auth(
        &format!("/complaints/{}", id),
        json!({ "tag_ids": [], "status": "resolved", "title": "t" }),
        &alice.token,
    )
    .await
    .assert_ok();

    let logs: Vec<serde_json::Value> = app
        .get_auth(&format!("/complaints/{}/audit-logs", id), &alice.token)
        .await
        .json();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["change_description"], "Updated: title, status, tags");
    assert_eq!(logs[1]["change_description"], "Updated: ");
}

#[tokio::test]
async fn test_audit_logs_for_unknown_complaint_is_empty() {
    let app = TestApp::new().await;
    let alice = app.seed_regular_user().await;

    let response = app.get_auth("/complaints/777/audit-logs", &alice.token).await;
    response.assert_ok();
    let logs: Vec<serde_json::Value> = response.json();
    assert!(logs.is_empty());
}

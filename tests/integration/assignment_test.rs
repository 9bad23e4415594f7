//! Integration tests for synchronous assignment and the CRUD endpoints.

use http::StatusCode;

use crate::helpers::{EDITOR, TestApp, assignment_body};

#[tokio::test]
async fn test_create_requires_actor() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/api/assignment", Some(assignment_body("s1", &["nba"])), None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
    assert!(app.backend.executed().await.is_empty());
}

#[tokio::test]
async fn test_create_executes_and_activates() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/assignment",
            Some(assignment_body("s1", &["nba", "nfl"])),
            Some(EDITOR),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["assignments"].as_array().unwrap().len(), 2);
    assert_eq!(response.body["results"]["totalProcessed"], 2);

    let executed = app.backend.executed().await;
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].locale, "en_GB");
    assert!(executed[0].use_native_logic);

    let view = app
        .request("GET", "/api/assignment/by-snippet/s1", None, None)
        .await;
    assert_eq!(view.status, StatusCode::OK);
    assert_eq!(view.body["summary"]["total"], 2);
    assert_eq!(view.body["summary"]["byStatus"]["ACTIVE"], 2);
    assert_eq!(view.body["grouped"]["league"].as_array().unwrap().len(), 2);

    let history = app
        .request("GET", "/api/assignment/s1/detailed-history", None, None)
        .await;
    assert_eq!(history.body["summary"]["total"], 4);
    assert_eq!(history.body["summary"]["byAction"]["CREATED"], 2);
    assert_eq!(history.body["summary"]["byAction"]["UPDATED"], 2);
}

#[tokio::test]
async fn test_create_rejects_existing_pairs() {
    let app = TestApp::new();
    app.request(
        "POST",
        "/api/assignment",
        Some(assignment_body("s1", &["nba"])),
        Some(EDITOR),
    )
    .await;

    let response = app
        .request(
            "POST",
            "/api/assignment",
            Some(assignment_body("s1", &["nba", "mlb"])),
            Some(EDITOR),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Assignments already exist: league/nba");
}

#[tokio::test]
async fn test_execution_failure_is_bad_request() {
    let app = TestApp::with_backend(
        snippet_client::mock::MockAssignmentBackend::new().rejecting_batch(1),
    );

    let response = app
        .request(
            "POST",
            "/api/assignment",
            Some(assignment_body("s1", &["nba"])),
            Some(EDITOR),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let message = response.body["message"].as_str().unwrap();
    assert!(message.starts_with("Assignment execution failed: Assignment failed at batch 1/1"));

    let view = app
        .request("GET", "/api/assignment/by-snippet/s1", None, None)
        .await;
    assert_eq!(view.body["summary"]["byStatus"]["PENDING"], 1);
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let app = TestApp::new();

    let mut underscore_locale = assignment_body("s1", &["nba"]);
    underscore_locale["locale"] = "en_GB".into();
    let response = app
        .request("POST", "/api/assignment", Some(underscore_locale), Some(EDITOR))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");

    let mut no_categories = assignment_body("s1", &["nba"]);
    no_categories["categoryTypes"] = serde_json::json!([]);
    let response = app
        .request("POST", "/api/assignment", Some(no_categories), Some(EDITOR))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/assignment",
            Some(serde_json::json!({ "snippetId": "s1" })),
            Some(EDITOR),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_and_paginates() {
    let app = TestApp::new();
    app.request(
        "POST",
        "/api/assignment",
        Some(assignment_body("s1", &["a", "b", "c"])),
        Some(EDITOR),
    )
    .await;
    app.request(
        "POST",
        "/api/assignment",
        Some(assignment_body("s2", &["a"])),
        Some(EDITOR),
    )
    .await;

    let response = app
        .request("GET", "/api/assignment?snippetId=s1&limit=2", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(response.body["pagination"]["total"], 3);
    assert_eq!(response.body["pagination"]["pages"], 2);

    let response = app
        .request("GET", "/api/assignment?status=FAILED", None, None)
        .await;
    assert_eq!(response.body["pagination"]["total"], 0);
    assert_eq!(response.body["pagination"]["pages"], 0);

    let response = app
        .request("GET", "/api/assignment?status=DONE", None, None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = TestApp::new();
    let created = app
        .request(
            "POST",
            "/api/assignment",
            Some(assignment_body("s1", &["nba", "nfl"])),
            Some(EDITOR),
        )
        .await;
    let id = created.body["assignments"][0]["id"].as_str().unwrap().to_string();
    let path = format!("/api/assignment/{id}");

    let collision = app
        .request(
            "PATCH",
            &path,
            Some(serde_json::json!({ "slug": "nfl" })),
            Some(EDITOR),
        )
        .await;
    assert_eq!(collision.status, StatusCode::BAD_REQUEST);

    let updated = app
        .request(
            "PATCH",
            &path,
            Some(serde_json::json!({ "status": "ARCHIVED", "syncMetadata": { "run": 7 } })),
            Some(EDITOR),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["status"], "ARCHIVED");
    assert_eq!(updated.body["syncMetadata"]["run"], 7);
    assert!(updated.body["lastSyncAt"].is_string());

    let deleted = app.request("DELETE", &path, None, Some(EDITOR)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Assignment deleted successfully");

    let again = app.request("DELETE", &path, None, Some(EDITOR)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let view = app
        .request("GET", "/api/assignment/by-snippet/s1", None, None)
        .await;
    assert_eq!(view.body["summary"]["total"], 1);
}

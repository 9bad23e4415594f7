//! Integration tests for the bulk pipeline, preview and health endpoints.

use std::time::Duration;

use http::StatusCode;
use snippet_client::mock::MockAssignmentBackend;

use crate::helpers::{EDITOR, TestApp, assignment_body};

#[tokio::test]
async fn test_bulk_assign_is_processed_by_worker() {
    let app = TestApp::new();
    app.worker.start().await;

    let queued = app
        .request(
            "POST",
            "/api/assignment/bulk-assign",
            Some(assignment_body("s1", &["nba", "nfl", "nhl"])),
            Some(EDITOR),
        )
        .await;
    assert_eq!(queued.status, StatusCode::ACCEPTED);
    assert_eq!(queued.body["status"], "PENDING");
    assert_eq!(queued.body["message"], "Assignment queued for processing");

    let assignment_id = queued.body["assignmentId"].as_str().unwrap();
    let done = app.wait_for_job(assignment_id, "COMPLETED").await;
    assert_eq!(done["results"]["totalProcessed"], 3);

    let view = app
        .request("GET", "/api/assignment/by-snippet/s1", None, None)
        .await;
    assert_eq!(view.body["summary"]["byStatus"]["ACTIVE"], 3);

    app.worker.stop().await;
}

#[tokio::test]
async fn test_bulk_failure_marks_job_and_rows_failed() {
    let app = TestApp::with_backend(MockAssignmentBackend::new().rejecting_batch(1));
    app.worker.start().await;

    let queued = app
        .request(
            "POST",
            "/api/assignment/bulk-assign",
            Some(assignment_body("s1", &["nba"])),
            Some(EDITOR),
        )
        .await;
    let assignment_id = queued.body["assignmentId"].as_str().unwrap();

    let failed = app.wait_for_job(assignment_id, "FAILED").await;
    let error = failed["error"].as_str().unwrap();
    assert!(error.contains("batch 1/1"), "unexpected error: {error}");

    let view = app
        .request("GET", "/api/assignment/by-snippet/s1", None, None)
        .await;
    assert_eq!(view.body["summary"]["byStatus"]["FAILED"], 1);

    app.worker.stop().await;
}

#[tokio::test]
async fn test_bulk_assign_without_worker_stays_queued() {
    let app = TestApp::new();

    let queued = app
        .request(
            "POST",
            "/api/assignment/bulk-assign",
            Some(assignment_body("s1", &["nba"])),
            Some(EDITOR),
        )
        .await;
    let path = format!(
        "/api/assignment/{}/status",
        queued.body["assignmentId"].as_str().unwrap()
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = app.request("GET", &path, None, None).await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["status"], "PENDING");

    let health = app.request("GET", "/api/assignment/health", None, None).await;
    assert_eq!(health.body["queue"]["queueLength"], 1);
    assert_eq!(health.body["queue"]["isWorkerRunning"], false);
}

#[tokio::test]
async fn test_unknown_job_status_is_not_found() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/assignment/assignment_0_missing/status", None, None)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Assignment assignment_0_missing not found");
}

#[tokio::test]
async fn test_preview_passes_reply_through() {
    let reply = serde_json::json!({ "totalCategories": 12, "categories": ["nba"] });
    let app = TestApp::with_backend(MockAssignmentBackend::new().with_preview(reply.clone()));

    let response = app
        .request(
            "POST",
            "/api/assignment/preview",
            Some(serde_json::json!({
                "snippetId": "s1",
                "assignments": [{ "catType": "league", "slugs": ["nba"] }],
                "categoryTypes": ["league"],
                "locale": "de-DE",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, reply);
    assert_eq!(app.backend.previewed().await[0].locale, "de_DE");
}

#[tokio::test]
async fn test_preview_failure_is_bad_gateway() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/assignment/preview",
            Some(serde_json::json!({
                "snippetId": "s1",
                "assignments": [{ "catType": "league", "slugs": ["nba"] }],
                "categoryTypes": ["league"],
                "locale": "en-GB",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["message"], "Failed to preview assignment");
}

#[tokio::test]
async fn test_sync_runs_batches_without_persisting() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/assignment/test-sync",
            Some(assignment_body("s1", &["nba", "nfl"])),
            Some(EDITOR),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["results"]["totalProcessed"], 2);
    assert!(
        response.body["testData"]["assignmentId"]
            .as_str()
            .unwrap()
            .starts_with("sync_test_")
    );
    assert_eq!(app.backend.executed().await.len(), 1);
    assert_eq!(app.store.history_len().await, 0);
}

#[tokio::test]
async fn test_health_reports_pipeline() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/assignment/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["statusStore"]["canRead"], true);
    assert_eq!(response.body["queue"]["queueLength"], 0);
    assert_eq!(response.body["backend"]["baseUrl"], "http://mock-backend");
}

#[tokio::test]
async fn test_backend_probe() {
    let failing = TestApp::new();
    let response = failing
        .request("GET", "/api/assignment/health/test-backend", None, None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "error");
    assert_eq!(response.body["error"], "Failed to preview assignment");

    let ok = TestApp::with_backend(
        MockAssignmentBackend::new().with_preview(serde_json::json!({ "ok": true })),
    );
    let response = ok
        .request("GET", "/api/assignment/health/test-backend", None, None)
        .await;
    assert_eq!(response.body["status"], "success");
    assert_eq!(response.body["backendUrl"], "http://mock-backend");
    assert_eq!(response.body["response"]["ok"], true);

    let probe = &ok.backend.previewed().await[0];
    assert_eq!(probe.locale, "en_GB");
    assert_eq!(probe.category_types, vec!["league".to_string()]);
}

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common;

#[tokio::test]
async fn health_reports_in_memory_store() {
    let app = common::test_app();
    let (status, body) = common::get(&app.router, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "in-memory");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = common::test_app();
    let (status, doc) = common::get(&app.router, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Rights Platform API");
    assert!(doc["paths"]["/api/complaints"].is_object());
}

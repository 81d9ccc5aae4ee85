use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use shared_types::UserRole;

use crate::common;

/// Submit a complaint carrying two evidence files and return its id and the
/// stored attachment list.
async fn submit_with_evidence(app: &common::TestApp, token: &str) -> (String, Vec<Value>) {
    let mut body = common::complaint_body();
    body["attachments"] = json!([
        { "name": "A.png", "mime_type": "image/png", "data": BASE64.encode(b"first") },
        { "name": "B.png", "mime_type": "image/png", "data": BASE64.encode(b"second") }
    ]);
    let (status, created) =
        common::post_json(&app.router, "/api/complaints", &body, Some(token)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let complaint = &created["complaint"];
    (
        complaint["id"].as_str().unwrap().to_string(),
        complaint["attachments"].as_array().unwrap().clone(),
    )
}

#[tokio::test]
async fn removing_an_attachment_persists_only_the_rest() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (id, stored) = submit_with_evidence(&app, &token).await;
    let uri = format!("/api/complaints/{id}");
    let kept = stored[1].clone();

    let (status, updated) = common::patch_json(
        &app.router,
        &uri,
        &json!({ "attachments": [kept.clone()] }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["attachments"], json!([kept.clone()]));

    let (_, reloaded) = common::get(&app.router, &uri, Some(&token)).await;
    assert_eq!(reloaded["attachments"], json!([kept]));
}

#[tokio::test]
async fn foreign_attachments_cannot_be_smuggled_in_by_editing() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (id, stored) = submit_with_evidence(&app, &token).await;
    let uri = format!("/api/complaints/{id}");

    let foreign = json!({
        "url": "https://evil.example/phish.exe",
        "name": "phish.exe",
        "mime_type": "application/x-msdownload",
        "size": 1
    });
    let (status, err) = common::patch_json(
        &app.router,
        &uri,
        &json!({ "attachments": [stored[0].clone(), foreign] }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["attachments"].is_string());

    let (_, reloaded) = common::get(&app.router, &uri, Some(&token)).await;
    assert_eq!(reloaded["attachments"], json!(stored));
}

#[tokio::test]
async fn editing_a_published_complaint_takes_it_off_the_public_feed() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);
    let id = common::submit_complaint(&app.router, &token).await;
    common::moderate(&app.router, &id, "published", Some("high_priority"), &moderator).await;
    let uri = format!("/api/complaints/{id}");
    assert_eq!(common::get(&app.router, &uri, None).await.0, StatusCode::OK);

    let (status, updated) = common::patch_json(
        &app.router,
        &uri,
        &json!({ "violation_description": "Rewritten after publication with new claims" }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["status"], "pending");
    assert_eq!(updated["priority"], Value::Null);
    assert_eq!(updated["reviewed_at"], Value::Null);

    assert_eq!(common::get(&app.router, &uri, None).await.0, StatusCode::NOT_FOUND);
    let (_, map) = common::get(&app.router, "/api/map/complaints", None).await;
    assert_eq!(map["markers"], json!([]));
}

#[tokio::test]
async fn overlong_titles_are_rejected_on_edit() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let id = common::submit_complaint(&app.router, &token).await;

    let (status, err) = common::patch_json(
        &app.router,
        &format!("/api/complaints/{id}"),
        &json!({ "title": "x".repeat(101) }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["title"].is_string());
}

#[tokio::test]
async fn strangers_cannot_edit_or_cancel() {
    let app = common::test_app();
    let (_, owner) = common::new_user(UserRole::User);
    let (_, stranger) = common::new_user(UserRole::User);
    let id = common::submit_complaint(&app.router, &owner).await;
    let uri = format!("/api/complaints/{id}");

    let (status, _) =
        common::patch_json(&app.router, &uri, &json!({ "title": "mine now" }), Some(&stranger))
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::delete(&app.router, &uri, Some(&stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_cancel_keeps_the_row_but_blocks_edits() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let id = common::submit_complaint(&app.router, &token).await;
    let uri = format!("/api/complaints/{id}");

    let (status, _) = common::delete(&app.router, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, mine) = common::get(&app.router, "/api/complaints/mine", Some(&token)).await;
    assert_eq!(mine[0]["status"], "cancelled");

    let (status, err) =
        common::patch_json(&app.router, &uri, &json!({ "title": "again" }), Some(&token)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "Conflict");
}

#[tokio::test]
async fn mine_lists_every_status_newest_first() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);
    let first = common::submit_complaint(&app.router, &token).await;
    let second = common::submit_complaint(&app.router, &token).await;
    common::moderate(&app.router, &first, "hidden", None, &moderator).await;

    let (status, mine) = common::get(&app.router, "/api/complaints/mine", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0]["id"], second.as_str());
    assert_eq!(mine[1]["status"], "hidden");
}

#[tokio::test]
async fn anonymous_authors_are_redacted_for_the_public() {
    let app = common::test_app();
    let (user_id, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);
    let mut body = common::complaint_body();
    body["is_anonymous"] = json!(true);
    let (_, created) = common::post_json(&app.router, "/api/complaints", &body, Some(&token)).await;
    let id = created["complaint"]["id"].as_str().unwrap().to_string();
    common::moderate(&app.router, &id, "published", None, &moderator).await;

    let uri = format!("/api/complaints/{id}");
    let (_, public) = common::get(&app.router, &uri, None).await;
    assert_eq!(public["user_id"], uuid::Uuid::nil().to_string());

    let (_, own) = common::get(&app.router, &uri, Some(&token)).await;
    assert_eq!(own["user_id"], user_id.to_string());
}

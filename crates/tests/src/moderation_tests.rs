use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::UserRole;

use crate::common;

#[tokio::test]
async fn regular_users_cannot_moderate() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let id = common::submit_complaint(&app.router, &token).await;

    let (status, _) = common::get(&app.router, "/api/moderation/complaints", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::moderate(&app.router, &id, "published", None, &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::get(&app.router, "/api/moderation/complaints", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn publishing_without_priority_defaults_to_normal() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (moderator_id, moderator) = common::new_user(UserRole::Moderator);
    let id = common::submit_complaint(&app.router, &token).await;

    let (status, snapshot) = common::moderate(&app.router, &id, "published", None, &moderator).await;

    assert_eq!(status, StatusCode::OK, "{snapshot}");
    let moderated = &snapshot["complaints"][0];
    assert_eq!(moderated["status"], "published");
    assert_eq!(moderated["priority"], "normal_priority");
    assert_eq!(moderated["assigned_moderator_id"], moderator_id.to_string());
    assert!(moderated["reviewed_at"].is_string());
}

#[tokio::test]
async fn each_action_returns_a_reloaded_list_and_stats() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);
    let a = common::submit_complaint(&app.router, &token).await;
    let b = common::submit_complaint(&app.router, &token).await;
    let c = common::submit_complaint(&app.router, &token).await;

    let (_, snapshot) =
        common::moderate(&app.router, &a, "published", Some("critical_priority"), &moderator).await;
    assert_eq!(
        snapshot["stats"],
        json!({
            "total": 3, "pending": 2, "published": 1, "hidden": 0,
            "by_priority": { "normal_priority": 0, "high_priority": 0, "critical_priority": 1 }
        })
    );

    let (_, snapshot) = common::moderate(&app.router, &b, "hidden", None, &moderator).await;
    assert_eq!(snapshot["stats"]["pending"], 1);
    assert_eq!(snapshot["stats"]["hidden"], 1);
    assert_eq!(snapshot["complaints"].as_array().unwrap().len(), 3);

    // Filters in the query string apply to the reloaded list.
    let (status, snapshot) = common::post_json(
        &app.router,
        &format!("/api/moderation/complaints/{c}?status=pending"),
        &json!({ "action": "hidden" }),
        Some(&moderator),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["complaints"], json!([]));
    assert_eq!(snapshot["stats"]["hidden"], 2);
}

#[tokio::test]
async fn moderation_list_filters_by_status_priority_and_text() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);
    let a = common::submit_complaint(&app.router, &token).await;
    common::submit_complaint(&app.router, &token).await;
    common::moderate(&app.router, &a, "published", Some("high_priority"), &moderator).await;

    let (_, snapshot) = common::get(
        &app.router,
        "/api/moderation/complaints?status=published&priority=high_priority",
        Some(&moderator),
    )
    .await;
    let listed = snapshot["complaints"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], a.as_str());
    assert_eq!(snapshot["stats"]["total"], 2);

    let (_, snapshot) = common::get(
        &app.router,
        "/api/moderation/complaints?q=CHECKPOINT&country=ua",
        Some(&moderator),
    )
    .await;
    assert_eq!(snapshot["complaints"].as_array().unwrap().len(), 2);

    let (_, snapshot) = common::get(
        &app.router,
        "/api/moderation/complaints?country=PL",
        Some(&moderator),
    )
    .await;
    assert_eq!(snapshot["complaints"], json!([]));
}

#[tokio::test]
async fn hidden_complaints_disappear_from_detail_map_and_feed() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);
    let id = common::submit_complaint(&app.router, &token).await;
    let uri = format!("/api/complaints/{id}");

    common::moderate(&app.router, &id, "published", None, &moderator).await;
    let (status, _) = common::get(&app.router, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, map) = common::get(&app.router, "/api/map/complaints", None).await;
    assert_eq!(map["markers"].as_array().unwrap().len(), 1);

    common::moderate(&app.router, &id, "hidden", None, &moderator).await;

    let (status, err) = common::get(&app.router, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "NotFound");

    let (_, map) = common::get(&app.router, "/api/map/complaints", None).await;
    assert_eq!(map["markers"], json!([]));

    let (_, feed) = common::get(&app.router, "/api/complaints?status=hidden", None).await;
    assert_eq!(feed, json!([]));

    let (status, _) = common::get(&app.router, &uri, Some(&moderator)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn cancelled_complaints_cannot_be_moderated() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);
    let id = common::submit_complaint(&app.router, &token).await;
    common::delete(&app.router, &format!("/api/complaints/{id}"), Some(&token)).await;

    let (status, _) = common::moderate(&app.router, &id, "published", None, &moderator).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = common::moderate(
        &app.router,
        &uuid::Uuid::new_v4().to_string(),
        "published",
        None,
        &moderator,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

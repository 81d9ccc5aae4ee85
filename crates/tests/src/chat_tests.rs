use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::{AppConfig, UserRole};

use crate::common;

#[tokio::test]
async fn disabled_assistant_is_not_found() {
    let app = common::test_app_without_chat();
    let (_, token) = common::new_user(UserRole::User);

    let (status, err) =
        common::post_json(&app.router, "/api/chat", &json!({ "message": "Hi" }), Some(&token))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "NotFound");
}

#[tokio::test]
async fn chat_requires_authentication() {
    let app = common::test_app();
    let (status, _) =
        common::post_json(&app.router, "/api/chat", &json!({ "message": "Hi" }), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn replies_and_forwards_the_last_ten_turns() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);

    let history: Vec<_> = (0..14)
        .map(|i| {
            json!({
                "role": if i % 2 == 0 { "user" } else { "assistant" },
                "content": format!("turn {i}")
            })
        })
        .collect();

    let (status, reply) = common::post_json(
        &app.router,
        "/api/chat",
        &json!({ "message": "  What are my rights at a checkpoint?  ", "history": history }),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{reply}");
    assert_eq!(
        reply,
        json!({ "text": "echo: What are my rights at a checkpoint?", "truncated": false })
    );
    let seen = app.chat.last_history.lock().unwrap().clone();
    assert_eq!(seen.len(), 10);
    assert_eq!(seen[0].content, "turn 4");
    assert_eq!(seen[9].content, "turn 13");
}

#[tokio::test]
async fn empty_messages_are_rejected() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);

    let (status, err) =
        common::post_json(&app.router, "/api/chat", &json!({ "message": "   " }), Some(&token))
            .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["message"].is_string());
}

#[tokio::test]
async fn chat_is_rate_limited_per_user() {
    let mut config = AppConfig::default();
    config.rate_limit.chat_per_minute = 1;
    let app = common::test_app_with(config);
    let (_, first) = common::new_user(UserRole::User);
    let (_, second) = common::new_user(UserRole::User);
    let body = json!({ "message": "Hello" });

    assert_eq!(
        common::post_json(&app.router, "/api/chat", &body, Some(&first)).await.0,
        StatusCode::OK
    );
    assert_eq!(
        common::post_json(&app.router, "/api/chat", &body, Some(&first)).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(
        common::post_json(&app.router, "/api/chat", &body, Some(&second)).await.0,
        StatusCode::OK
    );
}

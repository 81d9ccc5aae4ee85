use axum::http::StatusCode;
use base64::Engine;
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::UserRole;

use crate::common;

fn encoded(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[tokio::test]
async fn uploads_land_in_the_media_bucket() {
    let app = common::test_app();
    let (user, token) = common::new_user(UserRole::User);

    let (status, stored) = common::post_json(
        &app.router,
        "/api/media",
        &json!({
            "name": "avatar.png",
            "mime_type": "image/png",
            "data": encoded(b"\x89PNG avatar")
        }),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{stored}");
    let url = stored["url"].as_str().unwrap();
    assert!(url.starts_with(&format!("memory://media/{user}/")), "{url}");
    assert!(url.ends_with(".png"));
    assert_eq!(stored["size"], 11);
}

#[tokio::test]
async fn bad_uploads_are_field_errors() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);

    let (status, err) = common::post_json(
        &app.router,
        "/api/media",
        &json!({
            "name": "setup.exe",
            "mime_type": "application/x-msdownload",
            "data": encoded(b"MZ")
        }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["file"].is_string());

    let (status, _) = common::post_json(
        &app.router,
        "/api/media",
        &json!({
            "name": "photo.jpg",
            "mime_type": "image/jpeg",
            "data": "***not base64***"
        }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upload_requires_authentication() {
    let app = common::test_app();
    let (status, _) = common::post_json(
        &app.router,
        "/api/media",
        &json!({ "name": "a.png", "mime_type": "image/png", "data": encoded(b"x") }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

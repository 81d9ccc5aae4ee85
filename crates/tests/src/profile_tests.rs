use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use shared_types::UserRole;

use crate::common;

fn registration(name: &str) -> Value {
    json!({
        "display_name": name,
        "date_of_birth": "1990-05-01",
        "country_code": "ua"
    })
}

#[tokio::test]
async fn register_then_read_own_profile() {
    let app = common::test_app();
    let (id, token) = common::new_user(UserRole::User);

    let (status, _) = common::get(&app.router, "/api/profiles/me", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) =
        common::post_json(&app.router, "/api/profiles", &registration("Olena"), Some(&token))
            .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["id"], id.to_string());
    assert_eq!(created["country_code"], "UA");
    assert_eq!(created["role"], "user");
    assert_eq!(created["onboarding_completed"], false);

    let (status, me) = common::get(&app.router, "/api/profiles/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["date_of_birth"], "1990-05-01");

    let (status, _) =
        common::post_json(&app.router, "/api/profiles", &registration("Olena2"), Some(&token))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn display_names_are_unique_ignoring_case() {
    let app = common::test_app();
    let (_, first) = common::new_user(UserRole::User);
    let (_, second) = common::new_user(UserRole::User);

    let (_, answer) = common::get(
        &app.router,
        "/api/profiles/display-name-available?display_name=Taras",
        None,
    )
    .await;
    assert_eq!(answer, json!({ "display_name": "Taras", "available": true }));

    common::post_json(&app.router, "/api/profiles", &registration("Taras"), Some(&first)).await;

    let (_, answer) = common::get(
        &app.router,
        "/api/profiles/display-name-available?display_name=taras",
        None,
    )
    .await;
    assert_eq!(answer["available"], false);

    let (status, err) =
        common::post_json(&app.router, "/api/profiles", &registration("TARAS"), Some(&second))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "Conflict");
}

#[tokio::test]
async fn registration_rejects_children_and_earth() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);

    let mut body = registration("Young");
    body["date_of_birth"] = json!(chrono::Utc::now().date_naive().to_string());
    let (status, err) = common::post_json(&app.router, "/api/profiles", &body, Some(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["date_of_birth"].is_string());

    let mut body = registration("Nomad");
    body["country_code"] = json!("EARTH");
    let (status, err) = common::post_json(&app.router, "/api/profiles", &body, Some(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["country_code"].is_string());
}

#[tokio::test]
async fn public_profile_omits_private_fields_and_sees_updates() {
    let app = common::test_app();
    let (id, token) = common::new_user(UserRole::User);
    common::post_json(&app.router, "/api/profiles", &registration("Mykola"), Some(&token)).await;
    let uri = format!("/api/profiles/{id}");

    let (status, public) = common::get(&app.router, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["display_name"], "Mykola");
    assert!(public.get("date_of_birth").is_none());
    assert!(public.get("test_completed").is_none());

    let (status, updated) = common::patch_json(
        &app.router,
        "/api/profiles/me",
        &json!({
            "bio": "Volunteer driver",
            "social_links": [{ "platform": "telegram", "url": "https://t.me/mykola" }],
            "onboarding_completed": true
        }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["onboarding_completed"], true);

    let (_, public) = common::get(&app.router, &uri, None).await;
    assert_eq!(public["bio"], "Volunteer driver");
    assert_eq!(public["social_links"][0]["platform"], "telegram");
}

#[tokio::test]
async fn update_validates_avatar_url() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    common::post_json(&app.router, "/api/profiles", &registration("Iryna"), Some(&token)).await;

    let (status, err) = common::patch_json(
        &app.router,
        "/api/profiles/me",
        &json!({ "avatar_url": "not a url" }),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["avatar_url"].is_string());
}

#[tokio::test]
async fn unknown_profiles_are_not_found() {
    let app = common::test_app();
    let (status, err) =
        common::get(&app.router, &format!("/api/profiles/{}", uuid::Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "NotFound");
}

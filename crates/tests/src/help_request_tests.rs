use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use shared_types::UserRole;

use crate::common;

fn help_body() -> Value {
    json!({
        "title": "Evacuation transport for a family of four",
        "description": "We need a ride from Kharkiv to Lviv for two adults and two kids.",
        "help_types": ["evacuation", "housing"],
        "payment_details": {
            "iban": "UA213223130000026007233566001",
            "crypto_wallets": [{ "currency": "USDT", "address": "TXYZ" }]
        }
    })
}

#[tokio::test]
async fn create_requires_auth_and_valid_types() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);

    let (status, _) = common::post_json(&app.router, "/api/help-requests", &help_body(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut body = help_body();
    body["help_types"] = json!(["weapons"]);
    let (status, err) =
        common::post_json(&app.router, "/api/help-requests", &body, Some(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["help_types"].is_string());

    body["help_types"] = json!([]);
    let (status, _) =
        common::post_json(&app.router, "/api/help-requests", &body, Some(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn created_requests_are_listed_publicly() {
    let app = common::test_app();
    let (owner, token) = common::new_user(UserRole::User);

    let (status, created) =
        common::post_json(&app.router, "/api/help-requests", &help_body(), Some(&token)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["user_id"], owner.to_string());
    assert_eq!(created["status"], "active");
    assert_eq!(created["payment_details"]["crypto_wallets"][0]["currency"], "USDT");

    let (_, listed) = common::get(&app.router, "/api/help-requests", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);

    let uri = format!("/api/help-requests/{}", created["id"].as_str().unwrap());
    let (status, fetched) = common::get(&app.router, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Evacuation transport for a family of four");
}

#[tokio::test]
async fn only_the_author_edits_or_cancels() {
    let app = common::test_app();
    let (_, owner) = common::new_user(UserRole::User);
    let (_, stranger) = common::new_user(UserRole::User);

    let (_, created) =
        common::post_json(&app.router, "/api/help-requests", &help_body(), Some(&owner)).await;
    let uri = format!("/api/help-requests/{}", created["id"].as_str().unwrap());
    let edit = json!({ "help_types": ["food"] });

    let (status, _) = common::patch_json(&app.router, &uri, &edit, Some(&stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = common::delete(&app.router, &uri, Some(&stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = common::patch_json(&app.router, &uri, &edit, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["help_types"], json!(["food"]));
    assert_eq!(updated["title"], created["title"]);
}

#[tokio::test]
async fn cancelled_requests_are_hidden_from_everyone_but_the_author() {
    let app = common::test_app();
    let (_, owner) = common::new_user(UserRole::User);
    let (_, stranger) = common::new_user(UserRole::User);

    let (_, created) =
        common::post_json(&app.router, "/api/help-requests", &help_body(), Some(&owner)).await;
    let uri = format!("/api/help-requests/{}", created["id"].as_str().unwrap());

    let (status, cancelled) = common::delete(&app.router, &uri, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (_, listed) = common::get(&app.router, "/api/help-requests", None).await;
    assert_eq!(listed, json!([]));

    assert_eq!(common::get(&app.router, &uri, None).await.0, StatusCode::NOT_FOUND);
    assert_eq!(
        common::get(&app.router, &uri, Some(&stranger)).await.0,
        StatusCode::NOT_FOUND
    );
    assert_eq!(common::get(&app.router, &uri, Some(&owner)).await.0, StatusCode::OK);

    let (status, _) = common::patch_json(
        &app.router,
        &uri,
        &json!({ "title": "Still needed" }),
        Some(&owner),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

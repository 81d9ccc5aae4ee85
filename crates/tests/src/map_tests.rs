use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use server::map::clamp_to;
use shared_types::{Bounds, LatLng, UserRole};

use crate::common;

#[tokio::test]
async fn empty_map_shows_the_world() {
    let app = common::test_app();
    let (status, map) = common::get(&app.router, "/api/map/complaints", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(map["markers"], json!([]));
    assert_eq!(map["viewport"]["mode"], "world");
    assert_eq!(map["viewport"]["zoom"], 2);
    assert_eq!(
        map["max_bounds"],
        json!({ "south": -90.0, "west": -180.0, "north": 90.0, "east": 180.0 })
    );
}

#[tokio::test]
async fn markers_are_styled_by_priority_and_link_to_details() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);
    let critical = common::submit_complaint(&app.router, &token).await;
    let pending = common::submit_complaint(&app.router, &token).await;
    common::moderate(&app.router, &critical, "published", Some("critical_priority"), &moderator)
        .await;

    let (_, map) = common::get(&app.router, "/api/map/complaints", None).await;
    let markers = map["markers"].as_array().unwrap();

    assert_eq!(markers.len(), 1);
    assert_ne!(markers[0]["complaint_id"], pending.as_str());
    assert_eq!(markers[0]["color"], "#8B0000");
    assert_eq!(markers[0]["badge"], "!");
    assert_eq!(markers[0]["details_path"], format!("/complaints/{critical}"));
    assert_eq!(map["viewport"]["mode"], "center");
    assert_eq!(map["viewport"]["center"], json!({ "latitude": 50.4501, "longitude": 30.5234 }));
}

#[tokio::test]
async fn several_markers_fit_their_bounds() {
    let app = common::test_app();
    let (_, token) = common::new_user(UserRole::User);
    let (_, moderator) = common::new_user(UserRole::Moderator);

    let kyiv = common::submit_complaint(&app.router, &token).await;
    let mut body = common::complaint_body();
    body["country_code"] = json!("PL");
    body["address"] = json!("Marszalkowska 10, Warsaw");
    let (_, created) = common::post_json(&app.router, "/api/complaints", &body, Some(&token)).await;
    let warsaw = created["complaint"]["id"].as_str().unwrap().to_string();

    common::moderate(&app.router, &kyiv, "published", Some("high_priority"), &moderator).await;
    common::moderate(&app.router, &warsaw, "published", None, &moderator).await;

    let (_, map) = common::get(&app.router, "/api/map/complaints", None).await;
    assert_eq!(map["viewport"]["mode"], "fit_bounds");
    assert_eq!(map["viewport"]["padding_px"], 50);
    assert_eq!(
        map["viewport"]["bounds"],
        json!({ "south": 50.4501, "west": 21.0122, "north": 52.2297, "east": 30.5234 })
    );

    let (_, only_pl) = common::get(&app.router, "/api/map/complaints?country=PL", None).await;
    let markers = only_pl["markers"].as_array().unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["color"], "#FFD700");
}

#[tokio::test]
async fn panning_stays_inside_the_advertised_bounds() {
    let app = common::test_app();
    let (_, map) = common::get(&app.router, "/api/map/complaints", None).await;
    let bounds: Bounds = serde_json::from_value(map["max_bounds"].clone()).unwrap();

    let dragged = clamp_to(&bounds, LatLng::new(-91.5, 181.0));
    assert_eq!(dragged, LatLng::new(-90.0, 180.0));
    assert!(bounds.contains(dragged));
}

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use server::geocode::AddressAutocomplete;
use shared_types::AppConfig;

use crate::common;

#[tokio::test]
async fn suggestions_wait_for_three_characters_and_a_country() {
    let app = common::test_app();

    let (status, body) =
        common::get(&app.router, "/api/geocode/suggest?address=Ky&country=UA", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = common::get(&app.router, "/api/geocode/suggest?address=Kyiv", None).await;
    assert_eq!(body, json!([]));
    assert_eq!(app.geocoder.calls(), 0);

    let (_, body) =
        common::get(&app.router, "/api/geocode/suggest?address=Kyiv&country=UA", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["city"], "Kyiv");
    assert_eq!(app.geocoder.calls(), 1);
}

#[tokio::test]
async fn suggestions_from_other_countries_are_dropped() {
    let app = common::test_app();

    let (_, body) = common::get(
        &app.router,
        "/api/geocode/suggest?address=Kyiv%20Warsaw&country=PL",
        None,
    )
    .await;
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["country_code"], "PL");

    let (_, body) = common::get(
        &app.router,
        "/api/geocode/suggest?address=Kyiv%20Warsaw&country=EARTH",
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn search_resolves_within_the_selected_country() {
    let app = common::test_app();

    let (status, body) = common::get(
        &app.router,
        "/api/geocode/search?address=Khreshchatyk%201&country=ua",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latitude"], 50.4501);
    assert_eq!(body["postal_code"], "01001");

    let (status, err) = common::get(
        &app.router,
        "/api/geocode/search?address=Warsaw&country=UA",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "CountryMismatch");

    let (status, err) = common::get(
        &app.router,
        "/api/geocode/search?address=Atlantis&country=UA",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "GeocodeNotFound");
}

#[tokio::test]
async fn search_without_country_is_a_field_error() {
    let app = common::test_app();
    let (status, err) =
        common::get(&app.router, "/api/geocode/search?address=Kyiv", None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["country_code"].is_string());
    assert_eq!(app.geocoder.calls(), 0);
}

#[tokio::test]
async fn lookups_are_rate_limited() {
    let mut config = AppConfig::default();
    config.rate_limit.geocode_per_minute = 2;
    let app = common::test_app_with(config);
    let uri = "/api/geocode/suggest?address=Kyiv&country=UA";

    assert_eq!(common::get(&app.router, uri, None).await.0, StatusCode::OK);
    assert_eq!(common::get(&app.router, uri, None).await.0, StatusCode::OK);

    let (status, err) = common::get(&app.router, uri, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(err["kind"], "RateLimited");
    assert_eq!(app.geocoder.calls(), 2);

    // Other routes are not limited.
    assert_eq!(
        common::get(&app.router, "/api/map/complaints", None).await.0,
        StatusCode::OK
    );
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_limit() {
    let mut config = AppConfig::default();
    config.rate_limit.geocode_per_minute = 2;
    let app = common::test_app_with(config);
    let uri = "/api/geocode/suggest?address=Kyiv&country=UA";

    for spoofed in ["198.51.100.1", "198.51.100.2"] {
        let (status, _) = common::get_from(&app.router, uri, "203.0.113.7", spoofed).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = common::get_from(&app.router, uri, "203.0.113.7", "198.51.100.3").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // A different peer has its own budget.
    let (status, _) = common::get_from(&app.router, uri, "203.0.113.8", "198.51.100.3").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn trusted_proxies_forward_the_client_address() {
    let mut config = AppConfig::default();
    config.rate_limit.geocode_per_minute = 1;
    config.rate_limit.trusted_proxies = vec!["10.0.0.1".parse().unwrap()];
    let app = common::test_app_with(config);
    let uri = "/api/geocode/suggest?address=Kyiv&country=UA";

    let first = common::get_from(&app.router, uri, "10.0.0.1", "198.51.100.1").await;
    assert_eq!(first.0, StatusCode::OK);
    let other_client = common::get_from(&app.router, uri, "10.0.0.1", "198.51.100.2").await;
    assert_eq!(other_client.0, StatusCode::OK);
    let repeat = common::get_from(&app.router, uri, "10.0.0.1", "198.51.100.1").await;
    assert_eq!(repeat.0, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn embedded_autocomplete_only_looks_up_the_last_keystroke() {
    let geocoder = Arc::new(common::FakeGeocoder::default());
    let field = Arc::new(AddressAutocomplete::new(geocoder.clone(), 5));

    let typing = {
        let field = field.clone();
        tokio::spawn(async move { field.input("Kyi", Some("UA")).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let finished = field.input("Kyiv", Some("UA")).await;

    assert!(typing.await.unwrap().is_none());
    let suggestions = finished.unwrap().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].city.as_deref(), Some("Kyiv"));
    assert_eq!(geocoder.calls(), 1);
}

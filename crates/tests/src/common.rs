use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use server::auth::jwt::{create_access_token, JwtKeys};
use server::chat::ChatModel;
use server::db::AppState;
use server::geocode::Geocoder;
use shared_types::{AppConfig, AppError, ChatMessage, ChatReply, GeocodeResult, UserRole};

const TEST_SECRET: &[u8] = b"integration-test-secret";

/// Geocoder with a fixed gazetteer. Every call is recorded so tests can
/// prove that invalid submissions never reach it.
#[derive(Default)]
pub struct FakeGeocoder {
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn kyiv() -> GeocodeResult {
    GeocodeResult {
        latitude: 50.4501,
        longitude: 30.5234,
        city: Some("Kyiv".into()),
        region: Some("Kyiv City".into()),
        postal_code: Some("01001".into()),
        display_name: "Khreshchatyk St, Kyiv, Ukraine".into(),
        country_code: "UA".into(),
    }
}

pub fn warsaw() -> GeocodeResult {
    GeocodeResult {
        latitude: 52.2297,
        longitude: 21.0122,
        city: Some("Warsaw".into()),
        region: Some("Masovian Voivodeship".into()),
        postal_code: Some("00-001".into()),
        display_name: "Marszalkowska, Warsaw, Poland".into(),
        country_code: "PL".into(),
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn search(
        &self,
        address: &str,
        _country: Option<&str>,
        limit: u32,
    ) -> Result<Vec<GeocodeResult>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let address = address.to_lowercase();
        let mut found = Vec::new();
        if address.contains("khreshchatyk") || address.contains("kyiv") {
            found.push(kyiv());
        }
        if address.contains("marszalkowska") || address.contains("warsaw") {
            found.push(warsaw());
        }
        found.truncate(limit as usize);
        Ok(found)
    }
}

/// Chat model that echoes the message and remembers the history it got.
#[derive(Default)]
pub struct EchoModel {
    pub last_history: Mutex<Vec<ChatMessage>>,
}

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<ChatReply, AppError> {
        if let Ok(mut last) = self.last_history.lock() {
            *last = history.to_vec();
        }
        Ok(ChatReply {
            text: format!("echo: {message}"),
            truncated: false,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub geocoder: Arc<FakeGeocoder>,
    pub chat: Arc<EchoModel>,
}

/// Build the full application router on in-memory stores with fake
/// upstreams. The assistant is enabled.
pub fn test_app() -> TestApp {
    test_app_with(AppConfig::default())
}

pub fn test_app_with(config: AppConfig) -> TestApp {
    let mut state = AppState::in_memory(config, JwtKeys::new(TEST_SECRET))
        .expect("Failed to build in-memory state");
    let geocoder = Arc::new(FakeGeocoder::default());
    let chat = Arc::new(EchoModel::default());
    state.geocoder = geocoder.clone();
    state.chat = Some(chat.clone());

    let router = server::openapi::api_router(state.clone());
    TestApp {
        router,
        state,
        geocoder,
        chat,
    }
}

/// Build the router with the assistant switched off.
pub fn test_app_without_chat() -> TestApp {
    let mut app = test_app();
    app.state.chat = None;
    app.router = server::openapi::api_router(app.state.clone());
    app
}

/// Create a bearer token for `user_id` with the given role.
pub fn token_for(user_id: Uuid, role: UserRole) -> String {
    create_access_token(
        &JwtKeys::new(TEST_SECRET),
        user_id,
        role,
        chrono::Duration::minutes(15),
    )
    .expect("Failed to create test JWT")
}

/// A fresh user id with a matching token.
pub fn new_user(role: UserRole) -> (Uuid, String) {
    let id = Uuid::new_v4();
    (id, token_for(id, role))
}

fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    req
}

/// GET a route, optionally authenticated.
pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let req = builder("GET", uri, token).body(Body::empty()).unwrap();
    send(app, req).await
}

/// Anonymous GET arriving from `peer` with an `X-Forwarded-For` header, as
/// the server sees it behind `into_make_service_with_connect_info`.
pub async fn get_from(
    app: &Router,
    uri: &str,
    peer: &str,
    forwarded_for: &str,
) -> (StatusCode, Value) {
    let mut req = builder("GET", uri, None)
        .header("x-forwarded-for", forwarded_for)
        .body(Body::empty())
        .unwrap();
    let addr: SocketAddr = format!("{peer}:51000").parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    send(app, req).await
}

/// Send a JSON body with any method, optionally authenticated.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let req = builder(method, uri, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    send_json(app, "POST", uri, body, token).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    send_json(app, "PATCH", uri, body, token).await
}

/// DELETE a route, optionally authenticated.
pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let req = builder("DELETE", uri, token).body(Body::empty()).unwrap();
    send(app, req).await
}

/// Send a request through the router and parse the response.
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, body)
}

/// A valid submission body for an address in Kyiv.
pub fn complaint_body() -> Value {
    json!({
        "violation_description": "Journalist detained without charge at a checkpoint",
        "country_code": "UA",
        "address": "Khreshchatyk St 1, Kyiv",
        "violation_date": "2024-03-01",
        "violation_time": "14:30:00"
    })
}

/// Submit a complaint as `token` and return its id.
pub async fn submit_complaint(app: &Router, token: &str) -> String {
    let (status, body) = post_json(app, "/api/complaints", &complaint_body(), Some(token)).await;
    assert_eq!(status, StatusCode::CREATED, "submission failed: {body}");
    body["complaint"]["id"].as_str().unwrap().to_string()
}

/// Moderate a complaint and return the snapshot.
pub async fn moderate(
    app: &Router,
    id: &str,
    action: &str,
    priority: Option<&str>,
    moderator_token: &str,
) -> (StatusCode, Value) {
    let mut body = json!({ "action": action });
    if let Some(p) = priority {
        body["priority"] = json!(p);
    }
    post_json(
        app,
        &format!("/api/moderation/complaints/{id}"),
        &body,
        Some(moderator_token),
    )
    .await
}

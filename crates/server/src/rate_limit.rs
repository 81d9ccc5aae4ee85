use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_types::AppError;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::auth::jwt::Claims;

/// Sliding window rate limit state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    inner: Arc<Mutex<RateLimitInner>>,
    trusted_proxies: Arc<[IpAddr]>,
}

struct RateLimitInner {
    /// Map from client key -> list of request timestamps.
    requests: HashMap<String, Vec<Instant>>,
    /// Maximum requests allowed within the window.
    max_requests: u32,
    /// Sliding window duration.
    window: Duration,
}

impl RateLimitState {
    /// Create rate limiter allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimitInner {
                requests: HashMap::new(),
                max_requests,
                window,
            })),
            trusted_proxies: Arc::from(Vec::<IpAddr>::new()),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Believe `X-Forwarded-For` only on requests arriving from these peers.
    pub fn trusting(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = Arc::from(proxies);
        self
    }

    /// Check if a request from `key` is allowed. Returns true if allowed.
    pub fn check(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let window = inner.window;
        let max = inner.max_requests;

        // Drop callers whose window has fully expired so the map stays bounded
        // by the number of active clients.
        inner.requests.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < window);
            !timestamps.is_empty()
        });

        let timestamps = inner.requests.entry(key.to_string()).or_default();
        if timestamps.len() as u32 >= max {
            return false;
        }

        timestamps.push(now);
        true
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .requests
            .len()
    }

    /// Client key: the authenticated user, else the peer address. A trusted
    /// proxy's peer address is replaced by the first forwarded address.
    fn client_key(&self, request: &Request) -> String {
        if let Some(claims) = request.extensions().get::<Claims>() {
            return format!("user:{}", claims.sub);
        }
        let Some(ConnectInfo(peer)) = request.extensions().get::<ConnectInfo<SocketAddr>>() else {
            return "ip:unknown".to_string();
        };
        let peer = peer.ip();
        if !self.trusted_proxies.contains(&peer) {
            return format!("ip:{peer}");
        }
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        format!("ip:{}", forwarded.unwrap_or(peer))
    }
}

/// Axum middleware that enforces a [`RateLimitState`] per caller.
/// Must run inside the auth middleware so user ids are available.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let key = state.client_key(&request);

    if !state.check(&key) {
        tracing::info!(client = %key, path = %request.uri().path(), "rate limit exceeded");
        return AppError::rate_limited("Rate limit exceeded. Please try again later.")
            .into_response();
    }

    next.run(request).await
}

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use super::jwt::validate_access_token;
use crate::db::AppState;

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Permissive auth middleware.
///
/// A valid bearer token puts its `Claims` into the request extensions. A
/// missing or invalid token is not an error here; extractors downstream
/// decide whether the route needs a caller.
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(&req) {
        match validate_access_token(&state.jwt, token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid bearer token");
            }
        }
    }
    next.run(req).await
}

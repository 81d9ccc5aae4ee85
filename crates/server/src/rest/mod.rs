pub mod chat;
pub mod complaint;
pub mod geocode;
pub mod help_request;
pub mod map;
pub mod media;
pub mod moderation;
pub mod profile;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::db::AppState;
use crate::rate_limit::rate_limit_middleware;

/// Build the REST API router.
///
/// Geocoding and chat each get their own sliding-window limiter. The
/// limiters key on the caller, so the auth middleware must wrap this router.
pub fn api_router(state: &AppState) -> Router<AppState> {
    let geocoding = Router::new()
        .route("/api/geocode/search", get(geocode::search_address))
        .route("/api/geocode/suggest", get(geocode::suggest_addresses))
        .layer(from_fn_with_state(
            state.geocode_limiter.clone(),
            rate_limit_middleware,
        ));

    let assistant = Router::new()
        .route("/api/chat", post(chat::chat))
        .layer(from_fn_with_state(
            state.chat_limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Complaints
        .route(
            "/api/complaints",
            get(complaint::list_complaints).post(complaint::submit_complaint),
        )
        .route("/api/complaints/mine", get(complaint::my_complaints))
        .route(
            "/api/complaints/{id}",
            get(complaint::get_complaint)
                .patch(complaint::update_complaint)
                .delete(complaint::cancel_complaint),
        )
        // Moderation
        .route(
            "/api/moderation/complaints",
            get(moderation::list_for_moderation),
        )
        .route(
            "/api/moderation/complaints/{id}",
            post(moderation::moderate_complaint),
        )
        // Map
        .route("/api/map/complaints", get(map::map_complaints))
        // Help requests
        .route(
            "/api/help-requests",
            get(help_request::list_help_requests).post(help_request::create_help_request),
        )
        .route(
            "/api/help-requests/{id}",
            get(help_request::get_help_request)
                .patch(help_request::update_help_request)
                .delete(help_request::cancel_help_request),
        )
        // Profiles
        .route(
            "/api/profiles/display-name-available",
            get(profile::display_name_available),
        )
        .route("/api/profiles", post(profile::register_profile))
        .route(
            "/api/profiles/me",
            get(profile::get_my_profile).patch(profile::update_my_profile),
        )
        .route("/api/profiles/{id}", get(profile::get_profile))
        // Media
        .route("/api/media", post(media::upload_media))
        .merge(geocoding)
        .merge(assistant)
}

use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, Router};
use shared_types::{
    AppError, AppErrorKind, Attachment, AttachmentUpload, Bounds, ChatMessage, ChatReply,
    ChatRequest, ChatRole, Complaint, ComplaintFilters, ComplaintPriority, ComplaintStats,
    ComplaintStatus, CreateHelpRequest, CryptoWallet, DisplayNameAvailability, GeocodeResult,
    HelpRequest, HelpRequestStatus, LatLng, MapMarker, MapView, ModerateRequest,
    ModerationAction, ModerationSnapshot, PaymentDetails, PriorityBreakdown, PublicProfile,
    RegisterProfileRequest, SocialLink, SubmissionResponse, SubmitComplaintRequest,
    UpdateComplaintRequest, UpdateHelpRequest, UpdateProfileRequest, UserProfile, UserRole,
    Viewport,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::db::AppState;
use crate::health::{self, HealthResponse};
use crate::rest;

/// Default request body cap. Evidence is sent base64-encoded, so this has
/// to fit several 20 MB files.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Registers the `bearer_auth` scheme referenced by protected routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Complaints
        rest::complaint::submit_complaint,
        rest::complaint::list_complaints,
        rest::complaint::my_complaints,
        rest::complaint::get_complaint,
        rest::complaint::update_complaint,
        rest::complaint::cancel_complaint,
        // Moderation
        rest::moderation::list_for_moderation,
        rest::moderation::moderate_complaint,
        // Map
        rest::map::map_complaints,
        // Geocoding
        rest::geocode::search_address,
        rest::geocode::suggest_addresses,
        // Help requests
        rest::help_request::create_help_request,
        rest::help_request::list_help_requests,
        rest::help_request::get_help_request,
        rest::help_request::update_help_request,
        rest::help_request::cancel_help_request,
        // Profiles
        rest::profile::display_name_available,
        rest::profile::register_profile,
        rest::profile::get_my_profile,
        rest::profile::update_my_profile,
        rest::profile::get_profile,
        // Chat & media
        rest::chat::chat,
        rest::media::upload_media,
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind,
        Complaint, ComplaintStatus, ComplaintPriority, ComplaintFilters, ComplaintStats,
        PriorityBreakdown, Attachment, AttachmentUpload, SubmitComplaintRequest,
        SubmissionResponse, UpdateComplaintRequest, ModerateRequest, ModerationAction,
        ModerationSnapshot,
        LatLng, Bounds, MapMarker, MapView, Viewport, GeocodeResult,
        HelpRequest, HelpRequestStatus, CreateHelpRequest, UpdateHelpRequest, PaymentDetails,
        CryptoWallet,
        UserProfile, PublicProfile, UserRole, SocialLink, RegisterProfileRequest,
        UpdateProfileRequest, DisplayNameAvailability,
        ChatRequest, ChatReply, ChatMessage, ChatRole,
        HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "complaints", description = "Violation reports: submission, feed, owner edits"),
        (name = "moderation", description = "Moderator review of complaints"),
        (name = "map", description = "Violations map markers"),
        (name = "geocode", description = "Address search and autocomplete"),
        (name = "help-requests", description = "Requests for humanitarian help"),
        (name = "profiles", description = "Member profiles"),
        (name = "chat", description = "Human-rights assistant"),
        (name = "media", description = "Avatar and help-request file uploads"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Rights Platform API",
        description = "Human-rights violation reporting, moderation and mutual help",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build the application router: REST API, `/health`, and Swagger UI at
/// `/swagger-ui`, behind the permissive auth middleware.
///
/// The body cap can be changed with `MAX_UPLOAD_BYTES`.
pub fn api_router(state: AppState) -> Router {
    let max_body: usize = std::env::var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_BODY_BYTES);

    Router::new()
        .merge(rest::api_router(&state))
        .route("/health", axum::routing::get(health::health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(from_fn_with_state(
            state.clone(),
            crate::auth::middleware::auth_middleware,
        ))
        .with_state(state)
}

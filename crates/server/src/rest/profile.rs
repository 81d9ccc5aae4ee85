use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use shared_types::{
    AppError, DisplayNameAvailability, DisplayNameQuery, PublicProfile, RegisterProfileRequest,
    UpdateProfileRequest, UserProfile,
};

use crate::auth::extractors::AuthRequired;
use crate::db::AppState;
use crate::workflow::profiles;

/// Whether a display name is still free (case-insensitive).
#[utoipa::path(
    get,
    path = "/api/profiles/display-name-available",
    params(DisplayNameQuery),
    responses(
        (status = 200, description = "Availability", body = DisplayNameAvailability),
        (status = 422, description = "Empty display name", body = AppError)
    ),
    tag = "profiles"
)]
pub async fn display_name_available(
    State(state): State<AppState>,
    Query(query): Query<DisplayNameQuery>,
) -> Result<Json<DisplayNameAvailability>, AppError> {
    let answer = profiles::display_name_available(state.profiles.as_ref(), &query.display_name).await?;
    Ok(Json(answer))
}

/// Create the caller's profile. The token subject becomes the profile id.
#[utoipa::path(
    post,
    path = "/api/profiles",
    request_body = RegisterProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = UserProfile),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 409, description = "Profile exists or display name taken", body = AppError),
        (status = 422, description = "Invalid fields", body = AppError)
    ),
    tag = "profiles",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.0.sub))]
pub async fn register_profile(
    State(state): State<AppState>,
    auth: AuthRequired,
    Json(body): Json<RegisterProfileRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let profile = profiles::register(
        state.profiles.as_ref(),
        &state.profile_cache,
        auth.0.sub,
        body,
        Utc::now().date_naive(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    get,
    path = "/api/profiles/me",
    responses(
        (status = 200, description = "Caller's profile", body = UserProfile),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "No profile yet", body = AppError)
    ),
    tag = "profiles",
    security(("bearer_auth" = []))
)]
pub async fn get_my_profile(
    State(state): State<AppState>,
    auth: AuthRequired,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(profiles::me(&state.profile_cache, auth.0.sub).await?))
}

#[utoipa::path(
    patch,
    path = "/api/profiles/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "No profile yet", body = AppError),
        (status = 422, description = "Invalid fields", body = AppError)
    ),
    tag = "profiles",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.0.sub))]
pub async fn update_my_profile(
    State(state): State<AppState>,
    auth: AuthRequired,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let updated =
        profiles::update_me(state.profiles.as_ref(), &state.profile_cache, auth.0.sub, body)
            .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    get,
    path = "/api/profiles/{id}",
    params(("id" = Uuid, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 404, description = "Profile not found", body = AppError)
    ),
    tag = "profiles"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicProfile>, AppError> {
    Ok(Json(profiles::public(&state.profile_cache, id).await?))
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use shared_types::{AppError, ComplaintFilters, ModerateRequest, ModerationSnapshot};

use crate::auth::extractors::{RoleRequired, MODERATOR};
use crate::db::AppState;
use crate::workflow::moderation;

/// Moderation panel: complaints in any status plus statistics.
#[utoipa::path(
    get,
    path = "/api/moderation/complaints",
    params(ComplaintFilters),
    responses(
        (status = 200, description = "Filtered complaints and statistics", body = ModerationSnapshot),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Moderator role required", body = AppError)
    ),
    tag = "moderation",
    security(("bearer_auth" = []))
)]
pub async fn list_for_moderation(
    State(state): State<AppState>,
    _moderator: RoleRequired<MODERATOR>,
    Query(filters): Query<ComplaintFilters>,
) -> Result<Json<ModerationSnapshot>, AppError> {
    Ok(Json(moderation::snapshot(state.complaints.as_ref(), &filters).await?))
}

/// Publish or hide a complaint. The response carries the list (with the
/// same query filters) and statistics reloaded after the change.
#[utoipa::path(
    post,
    path = "/api/moderation/complaints/{id}",
    params(
        ("id" = Uuid, Path, description = "Complaint ID"),
        ComplaintFilters
    ),
    request_body = ModerateRequest,
    responses(
        (status = 200, description = "Complaint moderated", body = ModerationSnapshot),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 403, description = "Moderator role required", body = AppError),
        (status = 404, description = "Complaint not found", body = AppError),
        (status = 409, description = "Complaint cancelled by its author", body = AppError)
    ),
    tag = "moderation",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, moderator, body), fields(moderator_id = %moderator.0.sub))]
pub async fn moderate_complaint(
    State(state): State<AppState>,
    moderator: RoleRequired<MODERATOR>,
    Path(id): Path<Uuid>,
    Query(filters): Query<ComplaintFilters>,
    Json(body): Json<ModerateRequest>,
) -> Result<Json<ModerationSnapshot>, AppError> {
    let snapshot = moderation::moderate(
        state.complaints.as_ref(),
        moderator.0.sub,
        id,
        &body,
        &filters,
    )
    .await?;
    Ok(Json(snapshot))
}

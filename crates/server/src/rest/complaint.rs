use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use shared_types::{
    AppError, Complaint, ComplaintFilters, SubmissionResponse, SubmitComplaintRequest,
    UpdateComplaintRequest,
};

use crate::auth::extractors::{AuthRequired, MaybeAuth};
use crate::db::AppState;
use crate::workflow::complaints;
use crate::workflow::submission::Submission;

// ---------------------------------------------------------------------------
// POST /api/complaints
// ---------------------------------------------------------------------------

/// Submit a complaint. The row is created as `pending`; evidence that fails
/// to upload is listed in `failed_attachments`.
#[utoipa::path(
    post,
    path = "/api/complaints",
    request_body = SubmitComplaintRequest,
    responses(
        (status = 201, description = "Complaint submitted", body = SubmissionResponse),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 422, description = "Invalid fields, unknown address or country mismatch", body = AppError),
        (status = 502, description = "Geocoder unavailable", body = AppError)
    ),
    tag = "complaints",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.0.sub))]
pub async fn submit_complaint(
    State(state): State<AppState>,
    auth: AuthRequired,
    Json(body): Json<SubmitComplaintRequest>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let submission = Submission {
        complaints: state.complaints.as_ref(),
        geocoder: state.geocoder.as_ref(),
        evidence: state.evidence.as_ref(),
    };
    let response = submission.submit(auth.0.sub, body, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// ---------------------------------------------------------------------------
// GET /api/complaints
// ---------------------------------------------------------------------------

/// Public feed of published complaints, newest first.
#[utoipa::path(
    get,
    path = "/api/complaints",
    params(ComplaintFilters),
    responses(
        (status = 200, description = "Published complaints", body = Vec<Complaint>)
    ),
    tag = "complaints"
)]
pub async fn list_complaints(
    State(state): State<AppState>,
    Query(filters): Query<ComplaintFilters>,
) -> Result<Json<Vec<Complaint>>, AppError> {
    Ok(Json(complaints::feed(state.complaints.as_ref(), &filters).await?))
}

// ---------------------------------------------------------------------------
// GET /api/complaints/mine
// ---------------------------------------------------------------------------

/// The caller's own complaints in every status.
#[utoipa::path(
    get,
    path = "/api/complaints/mine",
    responses(
        (status = 200, description = "Caller's complaints", body = Vec<Complaint>),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    tag = "complaints",
    security(("bearer_auth" = []))
)]
pub async fn my_complaints(
    State(state): State<AppState>,
    auth: AuthRequired,
) -> Result<Json<Vec<Complaint>>, AppError> {
    Ok(Json(complaints::mine(state.complaints.as_ref(), auth.0.sub).await?))
}

// ---------------------------------------------------------------------------
// GET /api/complaints/{id}
// ---------------------------------------------------------------------------

/// Complaint detail. Counts a view. Unpublished complaints are only visible
/// to moderators and their author.
#[utoipa::path(
    get,
    path = "/api/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint", body = Complaint),
        (status = 404, description = "Not found or not visible", body = AppError)
    ),
    tag = "complaints"
)]
pub async fn get_complaint(
    State(state): State<AppState>,
    MaybeAuth(viewer): MaybeAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Complaint>, AppError> {
    let complaint = complaints::detail(state.complaints.as_ref(), id, viewer.as_ref()).await?;
    Ok(Json(complaint))
}

// ---------------------------------------------------------------------------
// PATCH /api/complaints/{id}
// ---------------------------------------------------------------------------

/// Owner edit of content and attachments. A present `attachments` list
/// replaces the stored one.
#[utoipa::path(
    patch,
    path = "/api/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = UpdateComplaintRequest,
    responses(
        (status = 200, description = "Complaint updated", body = Complaint),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Complaint not found", body = AppError),
        (status = 409, description = "Complaint cancelled", body = AppError),
        (status = 422, description = "Invalid fields", body = AppError)
    ),
    tag = "complaints",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.0.sub))]
pub async fn update_complaint(
    State(state): State<AppState>,
    auth: AuthRequired,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateComplaintRequest>,
) -> Result<Json<Complaint>, AppError> {
    let updated = complaints::edit(state.complaints.as_ref(), auth.0.sub, id, &body).await?;
    Ok(Json(updated))
}

// ---------------------------------------------------------------------------
// DELETE /api/complaints/{id}
// ---------------------------------------------------------------------------

/// Owner soft delete: the complaint becomes `cancelled`.
#[utoipa::path(
    delete,
    path = "/api/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 204, description = "Complaint cancelled"),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Complaint not found", body = AppError),
        (status = 409, description = "Already cancelled", body = AppError)
    ),
    tag = "complaints",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.0.sub))]
pub async fn cancel_complaint(
    State(state): State<AppState>,
    auth: AuthRequired,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    complaints::cancel(state.complaints.as_ref(), auth.0.sub, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_types::{AppError, CreateHelpRequest, HelpRequest, UpdateHelpRequest};

use crate::auth::extractors::{AuthRequired, MaybeAuth};
use crate::db::AppState;
use crate::workflow::help_requests;

#[utoipa::path(
    post,
    path = "/api/help-requests",
    request_body = CreateHelpRequest,
    responses(
        (status = 201, description = "Help request created", body = HelpRequest),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 422, description = "Invalid fields", body = AppError)
    ),
    tag = "help-requests",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.0.sub))]
pub async fn create_help_request(
    State(state): State<AppState>,
    auth: AuthRequired,
    Json(body): Json<CreateHelpRequest>,
) -> Result<(StatusCode, Json<HelpRequest>), AppError> {
    let created = help_requests::create(state.help_requests.as_ref(), auth.0.sub, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Active help requests, newest first.
#[utoipa::path(
    get,
    path = "/api/help-requests",
    responses(
        (status = 200, description = "Active help requests", body = Vec<HelpRequest>)
    ),
    tag = "help-requests"
)]
pub async fn list_help_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<HelpRequest>>, AppError> {
    Ok(Json(help_requests::list(state.help_requests.as_ref()).await?))
}

#[utoipa::path(
    get,
    path = "/api/help-requests/{id}",
    params(("id" = Uuid, Path, description = "Help request ID")),
    responses(
        (status = 200, description = "Help request", body = HelpRequest),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "help-requests"
)]
pub async fn get_help_request(
    State(state): State<AppState>,
    MaybeAuth(viewer): MaybeAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<HelpRequest>, AppError> {
    let viewer = viewer.map(|c| c.sub);
    Ok(Json(help_requests::get(state.help_requests.as_ref(), id, viewer).await?))
}

#[utoipa::path(
    patch,
    path = "/api/help-requests/{id}",
    params(("id" = Uuid, Path, description = "Help request ID")),
    request_body = UpdateHelpRequest,
    responses(
        (status = 200, description = "Help request updated", body = HelpRequest),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Help request cancelled", body = AppError),
        (status = 422, description = "Invalid fields", body = AppError)
    ),
    tag = "help-requests",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.0.sub))]
pub async fn update_help_request(
    State(state): State<AppState>,
    auth: AuthRequired,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateHelpRequest>,
) -> Result<Json<HelpRequest>, AppError> {
    let updated =
        help_requests::update(state.help_requests.as_ref(), auth.0.sub, id, &body).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/help-requests/{id}",
    params(("id" = Uuid, Path, description = "Help request ID")),
    responses(
        (status = 200, description = "Help request cancelled", body = HelpRequest),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "help-requests",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.0.sub))]
pub async fn cancel_help_request(
    State(state): State<AppState>,
    auth: AuthRequired,
    Path(id): Path<Uuid>,
) -> Result<Json<HelpRequest>, AppError> {
    let cancelled = help_requests::cancel(state.help_requests.as_ref(), auth.0.sub, id).await?;
    Ok(Json(cancelled))
}

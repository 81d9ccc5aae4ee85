use axum::{extract::State, http::StatusCode, Json};

use shared_types::{AppError, Attachment, AttachmentUpload};

use crate::auth::extractors::AuthRequired;
use crate::db::AppState;
use crate::workflow::media;

/// Upload an avatar or help-request file to the media bucket. The returned
/// `url` goes into `avatar_url` or `attachment_urls`.
#[utoipa::path(
    post,
    path = "/api/media",
    request_body = AttachmentUpload,
    responses(
        (status = 201, description = "File stored", body = Attachment),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 422, description = "Unsupported type, bad base64 or too large", body = AppError),
        (status = 502, description = "Storage unavailable", body = AppError)
    ),
    tag = "media",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.0.sub, file = %body.name))]
pub async fn upload_media(
    State(state): State<AppState>,
    auth: AuthRequired,
    Json(body): Json<AttachmentUpload>,
) -> Result<(StatusCode, Json<Attachment>), AppError> {
    let stored = media::upload(state.media.as_ref(), auth.0.sub, &body).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

use axum::{extract::State, Json};

use shared_types::{AppError, ChatReply, ChatRequest};

use crate::auth::extractors::AuthRequired;
use crate::db::AppState;

/// Ask the assistant. The last ten turns of `history` are forwarded.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 401, description = "Not authenticated", body = AppError),
        (status = 404, description = "Assistant disabled", body = AppError),
        (status = 422, description = "Empty message or blocked by safety filters", body = AppError),
        (status = 429, description = "Rate limited", body = AppError),
        (status = 502, description = "Model unavailable", body = AppError)
    ),
    tag = "chat",
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.0.sub))]
pub async fn chat(
    State(state): State<AppState>,
    auth: AuthRequired,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let model = state
        .chat
        .as_ref()
        .ok_or_else(|| AppError::not_found("The assistant is not enabled"))?;
    let reply = crate::chat::respond(model.as_ref(), &body).await?;
    if reply.truncated {
        tracing::info!("assistant reply truncated at the output limit");
    }
    Ok(Json(reply))
}

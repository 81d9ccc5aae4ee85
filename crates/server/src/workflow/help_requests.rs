use shared_types::{
    is_valid_help_type, AppError, CreateHelpRequest, HelpRequest, HelpRequestStatus,
    UpdateHelpRequest,
};
use tracing::info;
use uuid::Uuid;

use crate::error_convert::ValidateRequest;
use crate::repo::HelpRequestStore;

fn check_help_types(types: &[String]) -> Result<(), AppError> {
    if types.is_empty() {
        return Err(AppError::field("help_types", "Choose at least one type of help"));
    }
    if let Some(bad) = types.iter().find(|t| !is_valid_help_type(t)) {
        return Err(AppError::field("help_types", format!("Unknown help type '{bad}'")));
    }
    Ok(())
}

/// Empty payment details are stored as none.
fn normalize(mut req: CreateHelpRequest) -> CreateHelpRequest {
    if req.payment_details.as_ref().is_some_and(|p| p.is_empty()) {
        req.payment_details = None;
    }
    req.title = req.title.trim().to_string();
    req.description = req.description.trim().to_string();
    req
}

pub async fn create(
    store: &dyn HelpRequestStore,
    user_id: Uuid,
    req: CreateHelpRequest,
) -> Result<HelpRequest, AppError> {
    req.validate_request()?;
    check_help_types(&req.help_types)?;
    let created = store.insert(user_id, normalize(req)).await?;
    info!(help_request_id = %created.id, %user_id, "help request created");
    Ok(created)
}

pub async fn list(store: &dyn HelpRequestStore) -> Result<Vec<HelpRequest>, AppError> {
    store.list_active().await
}

/// Active requests are public; cancelled ones are visible to their owner only.
pub async fn get(
    store: &dyn HelpRequestStore,
    id: Uuid,
    viewer: Option<Uuid>,
) -> Result<HelpRequest, AppError> {
    let found = store
        .find(id)
        .await?
        .filter(|r| r.status == HelpRequestStatus::Active || viewer == Some(r.user_id));
    found.ok_or_else(|| AppError::not_found(format!("Help request {id} not found")))
}

async fn owned(
    store: &dyn HelpRequestStore,
    user_id: Uuid,
    id: Uuid,
) -> Result<HelpRequest, AppError> {
    let found = store
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Help request {id} not found")))?;
    if found.user_id != user_id {
        return Err(AppError::forbidden("Only the author can change this help request"));
    }
    Ok(found)
}

pub async fn update(
    store: &dyn HelpRequestStore,
    user_id: Uuid,
    id: Uuid,
    req: &UpdateHelpRequest,
) -> Result<HelpRequest, AppError> {
    req.validate_request()?;
    if let Some(types) = &req.help_types {
        check_help_types(types)?;
    }
    let current = owned(store, user_id, id).await?;
    if current.status == HelpRequestStatus::Cancelled {
        return Err(AppError::conflict("This help request has been cancelled"));
    }
    store
        .update(id, req)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Help request {id} not found")))
}

pub async fn cancel(
    store: &dyn HelpRequestStore,
    user_id: Uuid,
    id: Uuid,
) -> Result<HelpRequest, AppError> {
    owned(store, user_id, id).await?;
    let cancelled = store
        .set_status(id, HelpRequestStatus::Cancelled)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Help request {id} not found")))?;
    info!(help_request_id = %id, %user_id, "help request cancelled");
    Ok(cancelled)
}

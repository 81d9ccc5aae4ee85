//! Reading complaints and owner edits.

use shared_types::{
    is_allowed_attachment_type, AppError, Attachment, Complaint, ComplaintFilters,
    ComplaintStatus, UpdateComplaintRequest, MIN_DESCRIPTION_CHARS, TITLE_MAX_CHARS,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::repo::ComplaintStore;

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("Complaint {id} not found"))
}

/// Whether `viewer` may see `complaint`. Everyone sees published complaints;
/// moderators see everything; owners see their own.
pub fn can_view(complaint: &Complaint, viewer: Option<&Claims>) -> bool {
    if complaint.is_publicly_visible() {
        return true;
    }
    viewer.is_some_and(|c| c.can_moderate() || c.sub == complaint.user_id)
}

/// Public feed: published complaints only, whatever status was asked for.
pub async fn feed(
    store: &dyn ComplaintStore,
    filters: &ComplaintFilters,
) -> Result<Vec<Complaint>, AppError> {
    let filters = ComplaintFilters {
        status: Some(ComplaintStatus::Published),
        ..filters.clone()
    };
    Ok(store
        .list(&filters)
        .await?
        .into_iter()
        .map(Complaint::redacted)
        .collect())
}

/// Detail view. Counts a view and hides what the caller may not see behind
/// a 404.
pub async fn detail(
    store: &dyn ComplaintStore,
    id: Uuid,
    viewer: Option<&Claims>,
) -> Result<Complaint, AppError> {
    let mut complaint = store.find(id).await?.ok_or_else(|| not_found(id))?;
    if !can_view(&complaint, viewer) {
        return Err(not_found(id));
    }

    if let Some(views) = store.increment_views(id).await? {
        complaint.views = views;
    }

    let privileged = viewer.is_some_and(|c| c.can_moderate() || c.sub == complaint.user_id);
    Ok(if privileged {
        complaint
    } else {
        complaint.redacted()
    })
}

/// The caller's own complaints in every status.
pub async fn mine(store: &dyn ComplaintStore, user_id: Uuid) -> Result<Vec<Complaint>, AppError> {
    store.list_by_owner(user_id).await
}

async fn owned(
    store: &dyn ComplaintStore,
    user_id: Uuid,
    id: Uuid,
) -> Result<Complaint, AppError> {
    let complaint = store.find(id).await?.ok_or_else(|| not_found(id))?;
    if complaint.user_id != user_id {
        return Err(AppError::forbidden("Only the author can change this complaint"));
    }
    if complaint.status == ComplaintStatus::Cancelled {
        return Err(AppError::conflict("This complaint has been cancelled"));
    }
    Ok(complaint)
}

/// Attachments left after an owner edit: the stored entries whose URL the
/// owner listed, in the listed order. Evidence can be removed here but never
/// added or altered; new files go through submission.
pub fn kept_attachments(
    current: &[Attachment],
    requested: &[Attachment],
) -> Result<Vec<Attachment>, AppError> {
    let mut kept: Vec<Attachment> = Vec::with_capacity(requested.len());
    for wanted in requested {
        let stored = current
            .iter()
            .find(|a| a.url == wanted.url)
            .ok_or_else(|| {
                AppError::field("attachments", "Attachments can only be removed, not added")
            })?;
        if !is_allowed_attachment_type(&stored.mime_type) {
            return Err(AppError::field(
                "attachments",
                format!("'{}' is not an image, video or PDF", stored.name),
            ));
        }
        if !kept.iter().any(|a| a.url == stored.url) {
            kept.push(stored.clone());
        }
    }
    Ok(kept)
}

fn is_noop(req: &UpdateComplaintRequest) -> bool {
    req.title.is_none()
        && req.violation_description.is_none()
        && req.general_description.is_none()
        && req.offender_name.is_none()
        && req.affected_persons.is_none()
        && req.attachments.is_none()
}

/// Owner edit of content and attachments.
///
/// Any change sends the complaint back to the moderation queue: a published
/// or hidden complaint becomes `pending` again with its review cleared.
pub async fn edit(
    store: &dyn ComplaintStore,
    user_id: Uuid,
    id: Uuid,
    req: &UpdateComplaintRequest,
) -> Result<Complaint, AppError> {
    if let Some(title) = &req.title {
        let len = title.trim().chars().count();
        if len == 0 {
            return Err(AppError::field("title", "Title cannot be empty"));
        }
        if len > TITLE_MAX_CHARS {
            return Err(AppError::field(
                "title",
                format!("Title must be at most {TITLE_MAX_CHARS} characters"),
            ));
        }
    }
    if let Some(desc) = &req.violation_description {
        if desc.trim().chars().count() < MIN_DESCRIPTION_CHARS {
            return Err(AppError::field(
                "violation_description",
                format!("Description must be at least {MIN_DESCRIPTION_CHARS} characters"),
            ));
        }
    }

    let current = owned(store, user_id, id).await?;
    if is_noop(req) {
        return Ok(current);
    }

    let attachments = req
        .attachments
        .as_deref()
        .map(|requested| kept_attachments(&current.attachments, requested))
        .transpose()?;
    let edit = UpdateComplaintRequest {
        title: req.title.as_deref().map(|t| t.trim().to_string()),
        attachments,
        ..req.clone()
    };

    let updated = store
        .update_content(id, &edit)
        .await?
        .ok_or_else(|| AppError::conflict("This complaint has been cancelled"))?;
    info!(
        complaint_id = %id,
        %user_id,
        previous_status = current.status.as_str(),
        "complaint edited by owner, awaiting review"
    );
    Ok(updated)
}

/// Owner soft delete.
pub async fn cancel(store: &dyn ComplaintStore, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    owned(store, user_id, id).await?;
    if !store.cancel(id).await? {
        return Err(not_found(id));
    }
    info!(complaint_id = %id, %user_id, "complaint cancelled by owner");
    Ok(())
}

use chrono::{DateTime, Utc};
use shared_types::{
    AppError, ComplaintFilters, ComplaintPriority, ComplaintStatus, ModerateRequest,
    ModerationAction, ModerationSnapshot,
};
use tracing::info;
use uuid::Uuid;

use crate::repo::{ComplaintStore, Review};

/// Filtered list plus fresh statistics. Both are read from the store on
/// every call.
pub async fn snapshot(
    store: &dyn ComplaintStore,
    filters: &ComplaintFilters,
) -> Result<ModerationSnapshot, AppError> {
    let (complaints, stats) = tokio::try_join!(store.list(filters), store.stats())?;
    Ok(ModerationSnapshot { complaints, stats })
}

/// The review a moderator action writes.
///
/// Publishing always sets a priority, defaulting to normal. Priority is only
/// assigned on publish: hiding ignores any requested priority and leaves the
/// stored one untouched.
pub fn review_for(req: &ModerateRequest, moderator_id: Uuid, at: DateTime<Utc>) -> Review {
    let priority = match req.action {
        ModerationAction::Published => Some(req.priority.unwrap_or(ComplaintPriority::Normal)),
        ModerationAction::Hidden => None,
    };
    Review {
        status: req.action.target_status(),
        priority,
        moderator_id,
        note: req
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        reviewed_at: at,
    }
}

/// Apply a moderator action, then reload the list and statistics.
///
/// The caller's role is checked by the route extractor.
pub async fn moderate(
    store: &dyn ComplaintStore,
    moderator_id: Uuid,
    id: Uuid,
    req: &ModerateRequest,
    filters: &ComplaintFilters,
) -> Result<ModerationSnapshot, AppError> {
    let current = store
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Complaint {id} not found")))?;

    if current.status == ComplaintStatus::Cancelled {
        return Err(AppError::conflict("Cancelled complaints cannot be moderated"));
    }

    // The store refuses cancelled rows, so an owner cancel that lands after
    // the lookup above still wins.
    let review = review_for(req, moderator_id, Utc::now());
    store
        .apply_review(id, &review)
        .await?
        .ok_or_else(|| AppError::conflict("Cancelled complaints cannot be moderated"))?;

    info!(
        complaint_id = %id,
        %moderator_id,
        status = review.status.as_str(),
        priority = review.priority.map(|p| p.as_str()),
        "complaint moderated"
    );

    snapshot(store, filters).await
}

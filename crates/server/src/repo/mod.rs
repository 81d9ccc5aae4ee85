//! Persistence seams.
//!
//! Each entity has a store trait with a Postgres implementation (used in
//! production) and an in-memory implementation (used by tests and by the
//! server when `DATABASE_URL` is unset). Stores only persist; ownership and
//! role checks live in the services that call them.

pub mod complaint;
pub mod help_request;
pub mod memory;
pub mod profile;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{
    AppError, Attachment, Complaint, ComplaintFilters, ComplaintPriority, ComplaintStats,
    ComplaintStatus, CreateHelpRequest, HelpRequest, HelpRequestStatus, NewComplaint,
    RegisterProfileRequest, UpdateComplaintRequest, UpdateHelpRequest, UpdateProfileRequest,
    UserProfile,
};
use uuid::Uuid;

/// A moderator's decision as written to the complaint row.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub status: ComplaintStatus,
    /// `None` leaves the stored priority unchanged.
    pub priority: Option<ComplaintPriority>,
    pub moderator_id: Uuid,
    pub note: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

#[async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Insert with `status = pending`, no priority and no attachments.
    async fn insert(&self, new: NewComplaint) -> Result<Complaint, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Complaint>, AppError>;

    /// Matching complaints, newest first.
    async fn list(&self, filters: &ComplaintFilters) -> Result<Vec<Complaint>, AppError>;

    /// Every complaint owned by `user_id`, newest first.
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Complaint>, AppError>;

    /// Counters over the whole table.
    async fn stats(&self) -> Result<ComplaintStats, AppError>;

    /// Replace the attachment list.
    async fn set_attachments(
        &self,
        id: Uuid,
        attachments: &[Attachment],
    ) -> Result<Option<Complaint>, AppError>;

    /// Apply an owner edit; absent fields are left unchanged. The complaint
    /// goes back to `pending` with its review cleared. Cancelled rows are
    /// left alone and yield `None`.
    async fn update_content(
        &self,
        id: Uuid,
        req: &UpdateComplaintRequest,
    ) -> Result<Option<Complaint>, AppError>;

    /// Write a moderator decision. Cancelled rows are left alone and yield
    /// `None`.
    async fn apply_review(&self, id: Uuid, review: &Review) -> Result<Option<Complaint>, AppError>;

    /// Soft delete. Returns false when the complaint does not exist.
    async fn cancel(&self, id: Uuid) -> Result<bool, AppError>;

    /// Atomically bump the view counter; returns the new value.
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, AppError>;
}

#[async_trait]
pub trait HelpRequestStore: Send + Sync {
    async fn insert(&self, user_id: Uuid, req: CreateHelpRequest)
        -> Result<HelpRequest, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<HelpRequest>, AppError>;

    /// Active requests, newest first.
    async fn list_active(&self) -> Result<Vec<HelpRequest>, AppError>;

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateHelpRequest,
    ) -> Result<Option<HelpRequest>, AppError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: HelpRequestStatus,
    ) -> Result<Option<HelpRequest>, AppError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Create the profile of an authenticated account with role `user`.
    async fn insert(&self, id: Uuid, req: &RegisterProfileRequest)
        -> Result<UserProfile, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<UserProfile>, AppError>;

    /// Case-insensitive uniqueness check.
    async fn display_name_taken(&self, display_name: &str) -> Result<bool, AppError>;

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<Option<UserProfile>, AppError>;
}

/// Escape `%`, `_` and `\` so user text is matched literally by `ILIKE`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

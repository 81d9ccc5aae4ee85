//! In-memory stores backing tests and database-less development runs.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{
    AppError, Attachment, Complaint, ComplaintFilters, ComplaintStats, ComplaintStatus,
    CreateHelpRequest, HelpRequest, HelpRequestStatus, NewComplaint, RegisterProfileRequest,
    UpdateComplaintRequest, UpdateHelpRequest, UpdateProfileRequest, UserProfile, UserRole,
};
use uuid::Uuid;

use super::{ComplaintStore, HelpRequestStore, ProfileStore, Review};

fn poisoned() -> AppError {
    AppError::internal("In-memory store lock poisoned")
}

/// Rows are kept in insertion order; listings walk them backwards so the
/// newest entry comes first even when timestamps collide.
fn newest_first<'a, T, F>(rows: &'a [T], keep: F) -> Vec<T>
where
    T: Clone + 'a,
    F: Fn(&T) -> bool,
{
    rows.iter().rev().filter(|r| keep(r)).cloned().collect()
}

#[derive(Default)]
pub struct MemoryComplaintStore {
    rows: Mutex<Vec<Complaint>>,
}

impl MemoryComplaintStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify<F>(&self, id: Uuid, f: F) -> Result<Option<Complaint>, AppError>
    where
        F: FnOnce(&mut Complaint),
    {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows.iter_mut().find(|c| c.id == id).map(|c| {
            f(c);
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    /// Like `modify`, but cancelled complaints are treated as absent.
    fn modify_active<F>(&self, id: Uuid, f: F) -> Result<Option<Complaint>, AppError>
    where
        F: FnOnce(&mut Complaint),
    {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows
            .iter_mut()
            .find(|c| c.id == id && c.status != ComplaintStatus::Cancelled)
            .map(|c| {
                f(c);
                c.updated_at = Utc::now();
                c.clone()
            }))
    }
}

#[async_trait]
impl ComplaintStore for MemoryComplaintStore {
    async fn insert(&self, new: NewComplaint) -> Result<Complaint, AppError> {
        let now = Utc::now();
        let loc = new.location;
        let complaint = Complaint {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            is_anonymous: new.is_anonymous,
            title: new.title,
            violation_description: new.violation_description,
            general_description: new.general_description,
            offender_name: new.offender_name,
            affected_persons: new.affected_persons,
            violation_date: new.violation_date,
            country_code: new.country_code,
            address: new.address,
            latitude: loc.as_ref().map(|l| l.latitude),
            longitude: loc.as_ref().map(|l| l.longitude),
            city: loc.as_ref().and_then(|l| l.city.clone()),
            region: loc.as_ref().and_then(|l| l.region.clone()),
            postal_code: loc.as_ref().and_then(|l| l.postal_code.clone()),
            attachments: Vec::new(),
            status: ComplaintStatus::Pending,
            priority: None,
            reviewed_at: None,
            assigned_moderator_id: None,
            moderator_note: None,
            views: 0,
            upvotes: 0,
            created_at: now,
            updated_at: now,
        };
        self.rows
            .lock()
            .map_err(|_| poisoned())?
            .push(complaint.clone());
        Ok(complaint)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Complaint>, AppError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self, filters: &ComplaintFilters) -> Result<Vec<Complaint>, AppError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(newest_first(&rows, |c| filters.matches(c)))
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Complaint>, AppError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(newest_first(&rows, |c| c.user_id == user_id))
    }

    async fn stats(&self) -> Result<ComplaintStats, AppError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(ComplaintStats::tally(rows.iter()))
    }

    async fn set_attachments(
        &self,
        id: Uuid,
        attachments: &[Attachment],
    ) -> Result<Option<Complaint>, AppError> {
        self.modify(id, |c| c.attachments = attachments.to_vec())
    }

    async fn update_content(
        &self,
        id: Uuid,
        req: &UpdateComplaintRequest,
    ) -> Result<Option<Complaint>, AppError> {
        self.modify_active(id, |c| {
            if let Some(v) = &req.title {
                c.title = v.clone();
            }
            if let Some(v) = &req.violation_description {
                c.violation_description = v.clone();
            }
            if let Some(v) = &req.general_description {
                c.general_description = Some(v.clone());
            }
            if let Some(v) = &req.offender_name {
                c.offender_name = Some(v.clone());
            }
            if let Some(v) = &req.affected_persons {
                c.affected_persons = Some(v.clone());
            }
            if let Some(v) = &req.attachments {
                c.attachments = v.clone();
            }
            c.status = ComplaintStatus::Pending;
            c.priority = None;
            c.reviewed_at = None;
            c.assigned_moderator_id = None;
        })
    }

    async fn apply_review(&self, id: Uuid, review: &Review) -> Result<Option<Complaint>, AppError> {
        self.modify_active(id, |c| {
            c.status = review.status;
            if review.priority.is_some() {
                c.priority = review.priority;
            }
            c.assigned_moderator_id = Some(review.moderator_id);
            if review.note.is_some() {
                c.moderator_note = review.note.clone();
            }
            c.reviewed_at = Some(review.reviewed_at);
        })
    }

    async fn cancel(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .modify(id, |c| c.status = ComplaintStatus::Cancelled)?
            .is_some())
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, AppError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows.iter_mut().find(|c| c.id == id).map(|c| {
            c.views += 1;
            c.views
        }))
    }
}

#[derive(Default)]
pub struct MemoryHelpRequestStore {
    rows: Mutex<Vec<HelpRequest>>,
}

impl MemoryHelpRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HelpRequestStore for MemoryHelpRequestStore {
    async fn insert(
        &self,
        user_id: Uuid,
        req: CreateHelpRequest,
    ) -> Result<HelpRequest, AppError> {
        let now = Utc::now();
        let row = HelpRequest {
            id: Uuid::new_v4(),
            user_id,
            title: req.title,
            description: req.description,
            help_types: req.help_types,
            payment_details: req.payment_details,
            attachment_urls: req.attachment_urls,
            status: HelpRequestStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().map_err(|_| poisoned())?.push(row.clone());
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<HelpRequest>, AppError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<HelpRequest>, AppError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(newest_first(&rows, |r| r.status == HelpRequestStatus::Active))
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateHelpRequest,
    ) -> Result<Option<HelpRequest>, AppError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows.iter_mut().find(|r| r.id == id).map(|r| {
            if let Some(v) = &req.title {
                r.title = v.clone();
            }
            if let Some(v) = &req.description {
                r.description = v.clone();
            }
            if let Some(v) = &req.help_types {
                r.help_types = v.clone();
            }
            if let Some(v) = &req.payment_details {
                r.payment_details = Some(v.clone());
            }
            if let Some(v) = &req.attachment_urls {
                r.attachment_urls = v.clone();
            }
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: HelpRequestStatus,
    ) -> Result<Option<HelpRequest>, AppError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows.iter_mut().find(|r| r.id == id).map(|r| {
            r.status = status;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<Vec<UserProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile with an explicit role. Roles are never granted
    /// through the API, so tests and local setups use this instead.
    pub fn seed(&self, profile: UserProfile) -> Result<(), AppError> {
        self.rows.lock().map_err(|_| poisoned())?.push(profile);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn insert(
        &self,
        id: Uuid,
        req: &RegisterProfileRequest,
    ) -> Result<UserProfile, AppError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        let name = req.display_name.trim();
        if rows.iter().any(|p| p.id == id) {
            return Err(AppError::conflict("A profile already exists for this account"));
        }
        if rows.iter().any(|p| p.display_name.eq_ignore_ascii_case(name)) {
            return Err(AppError::conflict("This display name is already taken"));
        }
        let now = Utc::now();
        let profile = UserProfile {
            id,
            display_name: name.to_string(),
            date_of_birth: req.date_of_birth,
            country_code: req.country_code.clone(),
            role: UserRole::User,
            avatar_url: None,
            bio: None,
            social_links: Vec::new(),
            onboarding_completed: false,
            lesson_completed: false,
            test_completed: false,
            created_at: now,
            updated_at: now,
        };
        rows.push(profile.clone());
        Ok(profile)
    }

    async fn find(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows.iter().find(|p| p.id == id).cloned())
    }

    async fn display_name_taken(&self, display_name: &str) -> Result<bool, AppError> {
        let rows = self.rows.lock().map_err(|_| poisoned())?;
        let name = display_name.trim();
        Ok(rows.iter().any(|p| p.display_name.eq_ignore_ascii_case(name)))
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<Option<UserProfile>, AppError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned())?;
        Ok(rows.iter_mut().find(|p| p.id == id).map(|p| {
            if let Some(v) = &req.avatar_url {
                p.avatar_url = Some(v.clone());
            }
            if let Some(v) = &req.bio {
                p.bio = Some(v.clone());
            }
            if let Some(v) = &req.social_links {
                p.social_links = v.clone();
            }
            if let Some(v) = &req.country_code {
                p.country_code = v.clone();
            }
            if let Some(v) = req.onboarding_completed {
                p.onboarding_completed = v;
            }
            if let Some(v) = req.lesson_completed {
                p.lesson_completed = v;
            }
            if let Some(v) = req.test_completed {
                p.test_completed = v;
            }
            p.updated_at = Utc::now();
            p.clone()
        }))
    }
}

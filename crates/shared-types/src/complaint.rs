use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{is_earth, LatLng};
use crate::geocode::GeocodeResult;

// ── Validation constants ────────────────────────────────────────────

/// Titles derived from the description keep at most this many characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Minimum length of the violation description.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

/// Minimum length of the free-text address.
pub const MIN_ADDRESS_CHARS: usize = 5;

/// Upper bound on a single evidence file.
pub const MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

/// Where the client goes once a submission succeeds, and how long it waits.
pub const SUBMIT_REDIRECT_PATH: &str = "/complaints";
pub const SUBMIT_REDIRECT_DELAY_MS: u64 = 2000;

/// Images, video and PDF are accepted as evidence.
pub fn is_allowed_attachment_type(mime_type: &str) -> bool {
    let mime = mime_type.trim().to_ascii_lowercase();
    mime.starts_with("image/") || mime.starts_with("video/") || mime == "application/pdf"
}

/// First `TITLE_MAX_CHARS` characters of the description.
pub fn derive_title(description: &str) -> String {
    description.trim().chars().take(TITLE_MAX_CHARS).collect()
}

/// Combine the optional date and time fields of the form into one UTC instant.
/// A date without a time means midnight UTC; a time without a date is ignored.
pub fn combine_violation_datetime(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
) -> Option<DateTime<Utc>> {
    let date = date?;
    let time = time.unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}

// ── Workflow enums ──────────────────────────────────────────────────

/// Publication state of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    Published,
    Hidden,
    Cancelled,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::Published => "published",
            ComplaintStatus::Hidden => "hidden",
            ComplaintStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ComplaintStatus::Pending),
            "published" => Some(ComplaintStatus::Published),
            "hidden" => Some(ComplaintStatus::Hidden),
            "cancelled" => Some(ComplaintStatus::Cancelled),
            _ => None,
        }
    }
}

/// Moderator-assigned urgency. Only published complaints carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ComplaintPriority {
    #[serde(rename = "normal_priority")]
    Normal,
    #[serde(rename = "high_priority")]
    High,
    #[serde(rename = "critical_priority")]
    Critical,
}

impl ComplaintPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintPriority::Normal => "normal_priority",
            ComplaintPriority::High => "high_priority",
            ComplaintPriority::Critical => "critical_priority",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal_priority" => Some(ComplaintPriority::Normal),
            "high_priority" => Some(ComplaintPriority::High),
            "critical_priority" => Some(ComplaintPriority::Critical),
            _ => None,
        }
    }
}

/// The two transitions a moderator can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Published,
    Hidden,
}

impl ModerationAction {
    pub fn target_status(&self) -> ComplaintStatus {
        match self {
            ModerationAction::Published => ComplaintStatus::Published,
            ModerationAction::Hidden => ComplaintStatus::Hidden,
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────

/// A stored evidence file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Attachment {
    pub url: String,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
}

/// A reported human-rights violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Complaint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_anonymous: bool,
    pub title: String,
    pub violation_description: String,
    pub general_description: Option<String>,
    pub offender_name: Option<String>,
    pub affected_persons: Option<String>,
    pub violation_date: Option<DateTime<Utc>>,
    pub country_code: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub attachments: Vec<Attachment>,
    pub status: ComplaintStatus,
    pub priority: Option<ComplaintPriority>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub assigned_moderator_id: Option<Uuid>,
    pub moderator_note: Option<String>,
    pub views: i64,
    pub upvotes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Complaint {
    /// Only published complaints are shown to callers without a moderator role.
    pub fn is_publicly_visible(&self) -> bool {
        self.status == ComplaintStatus::Published
    }

    /// Position when both coordinates are present and in range.
    pub fn position(&self) -> Option<LatLng> {
        LatLng::from_pair(self.latitude, self.longitude).filter(LatLng::is_valid)
    }

    /// Copy of this complaint safe to show to the public: the owner id of an
    /// anonymous report is replaced by the nil UUID.
    pub fn redacted(mut self) -> Self {
        if self.is_anonymous {
            self.user_id = Uuid::nil();
        }
        self
    }
}

/// Field values for inserting a complaint. Status is always `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComplaint {
    pub user_id: Uuid,
    pub is_anonymous: bool,
    pub title: String,
    pub violation_description: String,
    pub general_description: Option<String>,
    pub offender_name: Option<String>,
    pub affected_persons: Option<String>,
    pub violation_date: Option<DateTime<Utc>>,
    pub country_code: String,
    pub address: String,
    pub location: Option<GeocodeResult>,
}

// ── Filters & statistics ────────────────────────────────────────────

/// Listing filters shared by the moderation panel and the public feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
pub struct ComplaintFilters {
    #[serde(default)]
    pub status: Option<ComplaintStatus>,
    /// ISO-2 code; `EARTH` or absent means every country.
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub priority: Option<ComplaintPriority>,
    /// Case-insensitive substring searched in title, descriptions, address
    /// and offender name.
    #[serde(default)]
    pub q: Option<String>,
}

impl ComplaintFilters {
    /// Country filter to apply, if any.
    pub fn country_code(&self) -> Option<String> {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !is_earth(c))
            .map(str::to_ascii_uppercase)
    }

    /// Trimmed, non-empty search text.
    pub fn search_text(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// The predicate every backend must agree with.
    pub fn matches(&self, complaint: &Complaint) -> bool {
        if let Some(status) = self.status {
            if complaint.status != status {
                return false;
            }
        }
        if let Some(country) = self.country_code() {
            if !complaint.country_code.eq_ignore_ascii_case(&country) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if complaint.priority != Some(priority) {
                return false;
            }
        }
        if let Some(text) = self.search_text() {
            let needle = text.to_lowercase();
            let hit = |s: &str| s.to_lowercase().contains(&needle);
            let found = hit(&complaint.title)
                || hit(&complaint.violation_description)
                || complaint.general_description.as_deref().is_some_and(hit)
                || hit(&complaint.address)
                || complaint.offender_name.as_deref().is_some_and(hit);
            if !found {
                return false;
            }
        }
        true
    }
}

/// Per-priority breakdown of reviewed complaints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PriorityBreakdown {
    pub normal_priority: i64,
    pub high_priority: i64,
    pub critical_priority: i64,
}

/// Aggregate counters shown above the moderation list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComplaintStats {
    pub total: i64,
    pub pending: i64,
    pub published: i64,
    pub hidden: i64,
    pub by_priority: PriorityBreakdown,
}

impl ComplaintStats {
    /// Count a full scan of complaints.
    pub fn tally<'a>(complaints: impl IntoIterator<Item = &'a Complaint>) -> Self {
        let mut stats = Self::default();
        for c in complaints {
            stats.total += 1;
            match c.status {
                ComplaintStatus::Pending => stats.pending += 1,
                ComplaintStatus::Published => stats.published += 1,
                ComplaintStatus::Hidden => stats.hidden += 1,
                ComplaintStatus::Cancelled => {}
            }
            match c.priority {
                Some(ComplaintPriority::Normal) => stats.by_priority.normal_priority += 1,
                Some(ComplaintPriority::High) => stats.by_priority.high_priority += 1,
                Some(ComplaintPriority::Critical) => stats.by_priority.critical_priority += 1,
                None => {}
            }
        }
        stats
    }
}

// ── Request / response DTOs ─────────────────────────────────────────

/// A file attached to a submission, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttachmentUpload {
    pub name: String,
    pub mime_type: String,
    /// Standard base64 of the file contents.
    pub data: String,
}

/// Body of `POST /api/complaints`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubmitComplaintRequest {
    /// Defaults to the first 100 characters of the violation description.
    #[serde(default)]
    pub title: Option<String>,
    pub violation_description: String,
    #[serde(default)]
    pub general_description: Option<String>,
    #[serde(default)]
    pub offender_name: Option<String>,
    #[serde(default)]
    pub affected_persons: Option<String>,
    #[serde(default)]
    pub violation_date: Option<NaiveDate>,
    #[serde(default)]
    pub violation_time: Option<NaiveTime>,
    pub country_code: String,
    pub address: String,
    /// Location captured when the user picked an autocomplete suggestion.
    #[serde(default)]
    pub selected_location: Option<GeocodeResult>,
    #[serde(default)]
    pub attachments: Vec<AttachmentUpload>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubmissionResponse {
    pub complaint: Complaint,
    /// Names of files that could not be stored; the complaint exists without them.
    pub failed_attachments: Vec<String>,
    pub redirect_to: String,
    pub redirect_after_ms: u64,
}

/// Body of `PATCH /api/complaints/{id}` (owner edits).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateComplaintRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub violation_description: Option<String>,
    #[serde(default)]
    pub general_description: Option<String>,
    #[serde(default)]
    pub offender_name: Option<String>,
    #[serde(default)]
    pub affected_persons: Option<String>,
    /// Replaces the whole attachment list when present.
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

/// Body of `POST /api/moderation/complaints/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModerateRequest {
    pub action: ModerationAction,
    #[serde(default)]
    pub priority: Option<ComplaintPriority>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A freshly loaded moderation list together with its statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModerationSnapshot {
    pub complaints: Vec<Complaint>,
    pub stats: ComplaintStats,
}

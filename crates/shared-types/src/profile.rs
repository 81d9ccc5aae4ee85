use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

/// Youngest and oldest ages accepted at registration.
pub const MIN_AGE_YEARS: i32 = 13;
pub const MAX_AGE_YEARS: i32 = 120;

/// Platform role controlling access to moderation.
///
/// - `User`: regular member.
/// - `Moderator`: can publish/hide complaints and set their priority.
/// - `Admin`: superset of every role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

impl UserRole {
    /// Parse from a token `role` claim or DB column. Unknown values default to `User`.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "moderator" => UserRole::Moderator,
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            UserRole::User => 0,
            UserRole::Moderator => 1,
            UserRole::Admin => 2,
        }
    }

    /// Whether this role grants everything `required` grants.
    pub fn satisfies(&self, required: &UserRole) -> bool {
        self.rank() >= required.rank()
    }

    pub fn can_moderate(&self) -> bool {
        self.satisfies(&UserRole::Moderator)
    }
}

/// Full years between `dob` and `today`.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

/// Whether a date of birth implies an age inside the accepted range.
pub fn is_allowed_age(dob: NaiveDate, today: NaiveDate) -> bool {
    (MIN_AGE_YEARS..=MAX_AGE_YEARS).contains(&age_on(dob, today))
}

/// A link to one of the member's social accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// Public member profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub date_of_birth: NaiveDate,
    pub country_code: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub social_links: Vec<SocialLink>,
    pub onboarding_completed: bool,
    pub lesson_completed: bool,
    pub test_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What other members see: the profile without date of birth or progress flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublicProfile {
    pub id: Uuid,
    pub display_name: String,
    pub country_code: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub social_links: Vec<SocialLink>,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for PublicProfile {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            display_name: p.display_name,
            country_code: p.country_code,
            role: p.role,
            avatar_url: p.avatar_url,
            bio: p.bio,
            social_links: p.social_links,
            created_at: p.created_at,
        }
    }
}

/// Body of `POST /api/profiles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct RegisterProfileRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 3, max = 32, message = "Display name must be 3-32 characters"))
    )]
    pub display_name: String,
    pub date_of_birth: NaiveDate,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 2, max = 5, message = "Country is required"))
    )]
    pub country_code: String,
}

/// Body of `PATCH /api/profiles/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateProfileRequest {
    #[cfg_attr(
        feature = "validation",
        validate(url(message = "Avatar must be a valid URL"))
    )]
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(length(max = 1000, message = "Bio must be at most 1000 characters"))
    )]
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub social_links: Option<Vec<SocialLink>>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub onboarding_completed: Option<bool>,
    #[serde(default)]
    pub lesson_completed: Option<bool>,
    #[serde(default)]
    pub test_completed: Option<bool>,
}

/// Query of `GET /api/profiles/display-name-available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
pub struct DisplayNameQuery {
    pub display_name: String,
}

/// Answer of the display-name uniqueness check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DisplayNameAvailability {
    pub display_name: String,
    pub available: bool,
}

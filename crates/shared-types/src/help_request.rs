use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

/// Kinds of help a request can ask for.
pub const HELP_TYPES: &[&str] = &[
    "financial",
    "medical",
    "legal",
    "housing",
    "food",
    "evacuation",
    "psychological",
    "other",
];

pub fn is_valid_help_type(s: &str) -> bool {
    HELP_TYPES.contains(&s)
}

/// Lifecycle of a help request. Cancelling is the only way to remove one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum HelpRequestStatus {
    Active,
    Cancelled,
}

impl HelpRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HelpRequestStatus::Active => "active",
            HelpRequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(HelpRequestStatus::Active),
            "cancelled" => Some(HelpRequestStatus::Cancelled),
            _ => None,
        }
    }
}

/// A crypto wallet donors can send funds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CryptoWallet {
    pub currency: String,
    pub address: String,
}

/// Optional ways to send money to the requester.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaymentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crypto_wallets: Vec<CryptoWallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paypal_email: Option<String>,
}

impl PaymentDetails {
    pub fn is_empty(&self) -> bool {
        self == &PaymentDetails::default()
    }
}

/// A request for mutual aid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HelpRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub help_types: Vec<String>,
    pub payment_details: Option<PaymentDetails>,
    pub attachment_urls: Vec<String>,
    pub status: HelpRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/help-requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateHelpRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))
    )]
    pub title: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 10, message = "Description must be at least 10 characters"))
    )]
    pub description: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Choose at least one type of help"))
    )]
    pub help_types: Vec<String>,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
    #[serde(default)]
    pub attachment_urls: Vec<String>,
}

/// Body of `PATCH /api/help-requests/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateHelpRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))
    )]
    #[serde(default)]
    pub title: Option<String>,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 10, message = "Description must be at least 10 characters"))
    )]
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub help_types: Option<Vec<String>>,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
    #[serde(default)]
    pub attachment_urls: Option<Vec<String>>,
}

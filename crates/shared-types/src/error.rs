use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Categorization of application errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AppErrorKind {
    NotFound,
    BadRequest,
    ValidationError,
    Conflict,
    DatabaseError,
    Unauthorized,
    Forbidden,
    RateLimited,
    InternalError,
    /// The geocoder returned no candidates for the address.
    GeocodeNotFound,
    /// The resolved address lies in a different country than the one selected.
    CountryMismatch,
    /// A third-party HTTP service failed or answered with a non-2xx status.
    UpstreamFailed,
    /// The chat model refused to answer (safety filters).
    ChatBlocked,
}

impl AppErrorKind {
    /// The message shown to end users for this kind of failure.
    ///
    /// This is the only place that turns error kinds into user-facing text;
    /// handlers and controllers never build their own banners.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppErrorKind::NotFound => "The requested item could not be found.",
            AppErrorKind::BadRequest => "The request could not be processed.",
            AppErrorKind::ValidationError => "Please correct the highlighted fields.",
            AppErrorKind::Conflict => "This value is already in use.",
            AppErrorKind::DatabaseError => "Saving failed. Please try again later.",
            AppErrorKind::Unauthorized => "Please sign in to continue.",
            AppErrorKind::Forbidden => "You do not have permission to do this.",
            AppErrorKind::RateLimited => "Too many requests. Please wait a moment and retry.",
            AppErrorKind::InternalError => "Something went wrong. Please try again.",
            AppErrorKind::GeocodeNotFound => {
                "Address not found. Enter a more specific address or pick one from the suggestion list."
            }
            AppErrorKind::CountryMismatch => {
                "The address is not in the selected country. Enter a more specific address or pick one from the suggestion list."
            }
            AppErrorKind::UpstreamFailed => "An external service is unavailable. Please retry.",
            AppErrorKind::ChatBlocked => {
                "The assistant cannot answer this message. Please rephrase it."
            }
        }
    }
}

impl fmt::Display for AppErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppErrorKind::NotFound => write!(f, "NotFound"),
            AppErrorKind::BadRequest => write!(f, "BadRequest"),
            AppErrorKind::ValidationError => write!(f, "ValidationError"),
            AppErrorKind::Conflict => write!(f, "Conflict"),
            AppErrorKind::DatabaseError => write!(f, "DatabaseError"),
            AppErrorKind::Unauthorized => write!(f, "Unauthorized"),
            AppErrorKind::Forbidden => write!(f, "Forbidden"),
            AppErrorKind::RateLimited => write!(f, "RateLimited"),
            AppErrorKind::InternalError => write!(f, "InternalError"),
            AppErrorKind::GeocodeNotFound => write!(f, "GeocodeNotFound"),
            AppErrorKind::CountryMismatch => write!(f, "CountryMismatch"),
            AppErrorKind::UpstreamFailed => write!(f, "UpstreamFailed"),
            AppErrorKind::ChatBlocked => write!(f, "ChatBlocked"),
        }
    }
}

/// Structured application error returned by every store, service and handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AppError {
    pub kind: AppErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub field_errors: HashMap<String, String>,
}

impl AppError {
    fn of(kind: AppErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::BadRequest, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::RateLimited, message)
    }

    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        Self {
            kind: AppErrorKind::ValidationError,
            message: message.into(),
            field_errors,
        }
    }

    /// Validation failure on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.clone());
        Self::validation(message, field_errors)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::Conflict, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::DatabaseError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::InternalError, message)
    }

    pub fn geocode_not_found(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::GeocodeNotFound, message)
    }

    pub fn country_mismatch(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::CountryMismatch, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::UpstreamFailed, message)
    }

    pub fn chat_blocked(message: impl Into<String>) -> Self {
        Self::of(AppErrorKind::ChatBlocked, message)
    }

    /// User-facing text for this error, derived from its kind.
    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }

    #[cfg_attr(not(feature = "server"), allow(dead_code))]
    fn status_code_u16(&self) -> u16 {
        match self.kind {
            AppErrorKind::NotFound => 404,
            AppErrorKind::BadRequest => 400,
            AppErrorKind::ValidationError => 422,
            AppErrorKind::Conflict => 409,
            AppErrorKind::DatabaseError => 500,
            AppErrorKind::Unauthorized => 401,
            AppErrorKind::Forbidden => 403,
            AppErrorKind::RateLimited => 429,
            AppErrorKind::InternalError => 500,
            AppErrorKind::GeocodeNotFound => 422,
            AppErrorKind::CountryMismatch => 422,
            AppErrorKind::UpstreamFailed => 502,
            AppErrorKind::ChatBlocked => 422,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(feature = "validation")]
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut field_errors = HashMap::new();
        for (field, errs) in errors.field_errors() {
            if let Some(first) = errs.first() {
                let msg = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                field_errors.insert(field.to_string(), msg);
            }
        }
        AppError::validation("Validation failed", field_errors)
    }
}

/// Wire shape of an error response: the error itself plus the user-facing text.
#[cfg(feature = "server")]
#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(flatten)]
    error: &'a AppError,
    user_message: &'static str,
}

#[cfg(feature = "server")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status_code_u16())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: &self,
            user_message: self.user_message(),
        };
        (status, axum::Json(body)).into_response()
    }
}

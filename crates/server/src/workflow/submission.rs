//! Complaint submission.
//!
//! A submission moves through [`Phase`]s. Everything that can be checked
//! locally is checked before the geocoder or any store is touched; once the
//! row exists, evidence uploads can only degrade the result, never fail it.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use shared_types::{
    combine_violation_datetime, country_matches, derive_title, is_allowed_attachment_type,
    is_valid_country_code, normalize_country_code, AppError, Attachment, AttachmentUpload,
    GeocodeResult, NewComplaint, SubmissionResponse, SubmitComplaintRequest, MAX_ATTACHMENT_BYTES,
    MIN_ADDRESS_CHARS, MIN_DESCRIPTION_CHARS, SUBMIT_REDIRECT_DELAY_MS, SUBMIT_REDIRECT_PATH,
    TITLE_MAX_CHARS,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::geocode::{geocode, Geocoder};
use crate::repo::ComplaintStore;
use crate::storage::{object_key, ObjectStore};

/// Stages of a submission, in order. `Geocoding` is skipped when the user
/// picked a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Geocoding,
    Persisting,
    UploadingAttachments,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Validating => "validating",
            Phase::Geocoding => "geocoding",
            Phase::Persisting => "persisting",
            Phase::UploadingAttachments => "uploading_attachments",
            Phase::Done => "done",
        }
    }
}

/// A decoded evidence file waiting for upload.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Output of local validation.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub country_code: String,
    pub address: String,
    pub violation_date: Option<DateTime<Utc>>,
    pub files: Vec<StagedFile>,
}

/// Decode and check one uploaded file. The error is the message to show
/// for the `attachments` field.
pub fn stage(upload: &AttachmentUpload) -> Result<StagedFile, String> {
    if !is_allowed_attachment_type(&upload.mime_type) {
        return Err(format!("'{}' is not an image, video or PDF", upload.name));
    }
    let bytes = BASE64
        .decode(upload.data.as_bytes())
        .map_err(|_| format!("'{}' is not valid base64", upload.name))?;
    if bytes.len() > MAX_ATTACHMENT_BYTES {
        return Err(format!("'{}' is larger than 20 MB", upload.name));
    }
    Ok(StagedFile {
        name: upload.name.clone(),
        mime_type: upload.mime_type.trim().to_ascii_lowercase(),
        bytes,
    })
}

fn char_len(s: &str) -> usize {
    s.trim().chars().count()
}

/// Check every field that needs no network access. All problems are
/// reported at once, keyed by field name.
pub fn validate(
    req: &SubmitComplaintRequest,
    now: DateTime<Utc>,
) -> Result<ValidatedSubmission, AppError> {
    let mut errors: HashMap<String, String> = HashMap::new();

    let country = req.country_code.trim();
    if country.is_empty() {
        errors.insert("country_code".into(), "Country is required".into());
    } else if !is_valid_country_code(country) {
        errors.insert("country_code".into(), "Unknown country code".into());
    }

    if char_len(&req.address) < MIN_ADDRESS_CHARS {
        errors.insert(
            "address".into(),
            format!("Address must be at least {MIN_ADDRESS_CHARS} characters"),
        );
    }

    if req.title.as_deref().is_some_and(|t| char_len(t) > TITLE_MAX_CHARS) {
        errors.insert(
            "title".into(),
            format!("Title must be at most {TITLE_MAX_CHARS} characters"),
        );
    }

    if char_len(&req.violation_description) < MIN_DESCRIPTION_CHARS {
        errors.insert(
            "violation_description".into(),
            format!("Description must be at least {MIN_DESCRIPTION_CHARS} characters"),
        );
    }

    let violation_date = combine_violation_datetime(req.violation_date, req.violation_time);
    if violation_date.is_some_and(|d| d > now) {
        errors.insert(
            "violation_date".into(),
            "Violation date cannot be in the future".into(),
        );
    }

    let mut files = Vec::with_capacity(req.attachments.len());
    for upload in &req.attachments {
        match stage(upload) {
            Ok(file) => files.push(file),
            Err(message) => {
                errors.insert("attachments".into(), message);
            }
        }
    }

    if !errors.is_empty() {
        return Err(AppError::validation("Validation failed", errors));
    }

    Ok(ValidatedSubmission {
        country_code: normalize_country_code(country),
        address: req.address.trim().to_string(),
        violation_date,
        files,
    })
}

/// Accept an autocomplete suggestion for the form's country.
///
/// A suggestion from another country is rejected and its coordinates are
/// not used. `EARTH` accepts any suggestion.
pub fn select_suggestion(
    form_country: &str,
    suggestion: &GeocodeResult,
) -> Result<GeocodeResult, AppError> {
    if !country_matches(form_country, &suggestion.country_code) {
        return Err(AppError::country_mismatch(format!(
            "Suggestion is in {}, not {}",
            suggestion.country_code,
            normalize_country_code(form_country)
        )));
    }
    if !suggestion.position().is_valid() {
        return Err(AppError::field("selected_location", "Suggestion has invalid coordinates"));
    }
    Ok(suggestion.clone())
}

/// Everything a submission touches.
pub struct Submission<'a> {
    pub complaints: &'a dyn ComplaintStore,
    pub geocoder: &'a dyn Geocoder,
    pub evidence: &'a dyn ObjectStore,
}

impl Submission<'_> {
    /// Run a submission end to end for `user_id`.
    pub async fn submit(
        &self,
        user_id: Uuid,
        req: SubmitComplaintRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmissionResponse, AppError> {
        let mut phase = Phase::Validating;
        let result = self.run(user_id, req, now, &mut phase).await;
        if let Err(e) = &result {
            warn!(%user_id, phase = phase.as_str(), error = %e, "complaint submission failed");
        }
        result
    }

    async fn run(
        &self,
        user_id: Uuid,
        req: SubmitComplaintRequest,
        now: DateTime<Utc>,
        phase: &mut Phase,
    ) -> Result<SubmissionResponse, AppError> {
        let valid = validate(&req, now)?;

        let location = match &req.selected_location {
            Some(suggestion) => select_suggestion(&valid.country_code, suggestion)?,
            None => {
                *phase = Phase::Geocoding;
                geocode(self.geocoder, &valid.address, &valid.country_code).await?
            }
        };

        *phase = Phase::Persisting;
        let title = req
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| derive_title(&req.violation_description));

        let complaint = self
            .complaints
            .insert(NewComplaint {
                user_id,
                is_anonymous: req.is_anonymous,
                title,
                violation_description: req.violation_description.trim().to_string(),
                general_description: non_blank(req.general_description),
                offender_name: non_blank(req.offender_name),
                affected_persons: non_blank(req.affected_persons),
                violation_date: valid.violation_date,
                country_code: valid.country_code,
                address: valid.address,
                location: Some(location),
            })
            .await?;
        info!(complaint_id = %complaint.id, %user_id, "complaint created");

        *phase = Phase::UploadingAttachments;
        let owner = user_id.to_string();
        let (attachments, failed_attachments) = upload_all(self.evidence, &owner, valid.files).await;

        let complaint = if attachments.is_empty() {
            complaint
        } else {
            self.complaints
                .set_attachments(complaint.id, &attachments)
                .await?
                .ok_or_else(|| AppError::not_found("Complaint disappeared during submission"))?
        };

        *phase = Phase::Done;
        Ok(SubmissionResponse {
            complaint,
            failed_attachments,
            redirect_to: SUBMIT_REDIRECT_PATH.to_string(),
            redirect_after_ms: SUBMIT_REDIRECT_DELAY_MS,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Upload files one at a time. Returns the stored attachments and the names
/// of files that failed.
pub async fn upload_all(
    store: &dyn ObjectStore,
    owner: &str,
    files: Vec<StagedFile>,
) -> (Vec<Attachment>, Vec<String>) {
    let mut stored = Vec::with_capacity(files.len());
    let mut failed = Vec::new();

    for file in files {
        let key = object_key(owner, &file.name);
        let size = file.bytes.len() as i64;
        match store.put(&key, &file.mime_type, file.bytes).await {
            Ok(url) => stored.push(Attachment {
                url,
                name: file.name,
                mime_type: file.mime_type,
                size,
            }),
            Err(e) => {
                warn!(file = %file.name, error = %e, "attachment upload failed, skipping");
                failed.push(file.name);
            }
        }
    }

    (stored, failed)
}

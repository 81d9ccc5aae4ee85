use chrono::NaiveDate;
use shared_types::{
    is_allowed_age, is_earth, is_valid_country_code, normalize_country_code, AppError,
    DisplayNameAvailability, PublicProfile, RegisterProfileRequest, UpdateProfileRequest,
    UserProfile, MAX_AGE_YEARS, MIN_AGE_YEARS,
};
use tracing::info;
use uuid::Uuid;

use crate::error_convert::ValidateRequest;
use crate::profile_cache::ProfileCache;
use crate::repo::ProfileStore;

pub async fn display_name_available(
    store: &dyn ProfileStore,
    display_name: &str,
) -> Result<DisplayNameAvailability, AppError> {
    let name = display_name.trim();
    if name.is_empty() {
        return Err(AppError::field("display_name", "Display name is required"));
    }
    Ok(DisplayNameAvailability {
        display_name: name.to_string(),
        available: !store.display_name_taken(name).await?,
    })
}

/// Create the caller's profile. `today` anchors the age check.
pub async fn register(
    store: &dyn ProfileStore,
    cache: &ProfileCache,
    user_id: Uuid,
    mut req: RegisterProfileRequest,
    today: NaiveDate,
) -> Result<UserProfile, AppError> {
    req.display_name = req.display_name.trim().to_string();
    req.validate_request()?;

    if !is_valid_country_code(&req.country_code) || is_earth(&req.country_code) {
        return Err(AppError::field("country_code", "Choose your country"));
    }
    req.country_code = normalize_country_code(&req.country_code);

    if !is_allowed_age(req.date_of_birth, today) {
        return Err(AppError::field(
            "date_of_birth",
            format!("Age must be between {MIN_AGE_YEARS} and {MAX_AGE_YEARS}"),
        ));
    }

    if store.find(user_id).await?.is_some() {
        return Err(AppError::conflict("A profile already exists for this account"));
    }
    if store.display_name_taken(&req.display_name).await? {
        return Err(AppError::conflict("This display name is already taken"));
    }

    let profile = store.insert(user_id, &req).await?;
    cache.put(profile.clone()).await;
    info!(%user_id, display_name = %profile.display_name, "profile registered");
    Ok(profile)
}

pub async fn me(cache: &ProfileCache, user_id: Uuid) -> Result<UserProfile, AppError> {
    cache.get(user_id).await
}

pub async fn public(cache: &ProfileCache, id: Uuid) -> Result<PublicProfile, AppError> {
    cache.get(id).await.map(PublicProfile::from)
}

/// Update the caller's profile and drop the cached copy.
pub async fn update_me(
    store: &dyn ProfileStore,
    cache: &ProfileCache,
    user_id: Uuid,
    mut req: UpdateProfileRequest,
) -> Result<UserProfile, AppError> {
    req.validate_request()?;
    if let Some(code) = &req.country_code {
        if !is_valid_country_code(code) || is_earth(code) {
            return Err(AppError::field("country_code", "Choose your country"));
        }
        req.country_code = Some(normalize_country_code(code));
    }

    let updated = store
        .update(user_id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("Profile not found"))?;
    cache.invalidate(user_id).await;
    Ok(updated)
}

use axum::{
    extract::{Query, State},
    Json,
};

use shared_types::{AppError, GeocodeQuery, GeocodeResult};

use crate::db::AppState;
use crate::geocode;

/// Resolve an address within the selected country (`EARTH` for anywhere).
#[utoipa::path(
    get,
    path = "/api/geocode/search",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Best candidate", body = GeocodeResult),
        (status = 422, description = "Address not found or in another country", body = AppError),
        (status = 429, description = "Too many lookups", body = AppError),
        (status = 502, description = "Geocoder unavailable", body = AppError)
    ),
    tag = "geocode"
)]
pub async fn search_address(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResult>, AppError> {
    let country = query.country.as_deref().unwrap_or_default();
    let result = geocode::geocode(state.geocoder.as_ref(), &query.address, country).await?;
    Ok(Json(result))
}

/// Autocomplete suggestions. Empty until the address has three characters
/// and a country is chosen.
#[utoipa::path(
    get,
    path = "/api/geocode/suggest",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Candidates in the selected country", body = Vec<GeocodeResult>),
        (status = 429, description = "Too many lookups", body = AppError),
        (status = 502, description = "Geocoder unavailable", body = AppError)
    ),
    tag = "geocode"
)]
pub async fn suggest_addresses(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Vec<GeocodeResult>>, AppError> {
    let suggestions = geocode::suggest(
        state.geocoder.as_ref(),
        &query.address,
        query.country.as_deref(),
        state.config.geocoding.suggestion_limit,
    )
    .await?;
    Ok(Json(suggestions))
}

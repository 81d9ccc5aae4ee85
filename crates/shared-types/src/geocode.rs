use serde::{Deserialize, Serialize};

use crate::common::LatLng;

/// Minimum address length before autocomplete suggestions are requested.
pub const SUGGEST_MIN_CHARS: usize = 3;

/// Quiet period the autocomplete waits for before calling the geocoder.
pub const SUGGEST_DEBOUNCE_MS: u64 = 500;

/// A resolved address candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub display_name: String,
    /// Upper-case ISO-2 code of the country the candidate lies in.
    pub country_code: String,
}

impl GeocodeResult {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Query string for `/api/geocode/search` and `/api/geocode/suggest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
pub struct GeocodeQuery {
    pub address: String,
    /// ISO-2 country code or `EARTH`.
    #[serde(default)]
    pub country: Option<String>,
}

/// Whether an autocomplete request should reach the geocoder at all.
pub fn should_suggest(address: &str, country: Option<&str>) -> bool {
    let has_country = country.map(|c| !c.trim().is_empty()).unwrap_or(false);
    has_country && address.trim().chars().count() >= SUGGEST_MIN_CHARS
}

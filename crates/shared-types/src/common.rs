use serde::{Deserialize, Serialize};

/// Country-code sentinel meaning "no specific country": disables every
/// country-scoped filter and country-match check.
pub const EARTH: &str = "EARTH";

/// Whether `code` is the global sentinel (case-insensitive).
pub fn is_earth(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(EARTH)
}

/// Upper-case and trim a country code. `EARTH` is kept as is.
pub fn normalize_country_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Accepts ISO 3166-1 alpha-2 codes and the `EARTH` sentinel.
pub fn is_valid_country_code(code: &str) -> bool {
    let code = code.trim();
    is_earth(code) || (code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Compare two country codes the way the geocoding pipeline does: `EARTH`
/// on the selected side matches everything, otherwise codes must be equal
/// ignoring case.
pub fn country_matches(selected: &str, resolved: &str) -> bool {
    is_earth(selected) || selected.trim().eq_ignore_ascii_case(resolved.trim())
}

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Build a point from a pair of optional coordinates. Both halves must be
    /// present; a lone latitude or longitude yields `None`.
    pub fn from_pair(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Some(Self::new(lat, lng)),
            _ => None,
        }
    }
}

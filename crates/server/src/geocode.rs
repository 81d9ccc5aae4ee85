//! Address geocoding against a Nominatim-compatible search API.
//!
//! [`Geocoder`] is the raw search seam. [`geocode`] and [`suggest`] layer the
//! country rules on top: a selected country other than `EARTH` is passed as
//! the `countrycodes` filter and every resolved candidate must agree with it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shared_types::{
    country_matches, is_earth, normalize_country_code, should_suggest, AppError, GeocodeResult,
    GeocodingSettings, SUGGEST_DEBOUNCE_MS,
};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Candidates for `address`, best first. `country` is an upper-case
    /// ISO-2 filter; `None` searches the whole world.
    async fn search(
        &self,
        address: &str,
        country: Option<&str>,
        limit: u32,
    ) -> Result<Vec<GeocodeResult>, AppError>;
}

/// Country filter to send upstream for a selected country.
fn upstream_filter(country: &str) -> Option<String> {
    if is_earth(country) {
        None
    } else {
        Some(normalize_country_code(country))
    }
}

/// Resolve one address to coordinates.
///
/// Fails with `GeocodeNotFound` when there is no candidate and with
/// `CountryMismatch` when the best candidate lies outside `country`.
pub async fn geocode(
    geocoder: &dyn Geocoder,
    address: &str,
    country: &str,
) -> Result<GeocodeResult, AppError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AppError::field("address", "Address is required"));
    }
    if country.trim().is_empty() {
        return Err(AppError::field("country_code", "Country is required"));
    }

    let filter = upstream_filter(country);
    let top = geocoder
        .search(address, filter.as_deref(), 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::geocode_not_found(format!("No location found for '{address}'")))?;

    if !country_matches(country, &top.country_code) {
        tracing::info!(
            selected = %country,
            resolved = %top.country_code,
            "geocoded address outside selected country"
        );
        return Err(AppError::country_mismatch(format!(
            "Address resolves to {}, not {}",
            top.country_code,
            normalize_country_code(country)
        )));
    }

    Ok(top)
}

/// Autocomplete candidates for a partially typed address.
///
/// Returns nothing until the address is long enough and a country is
/// chosen. Candidates from another country are dropped even if the upstream
/// filter let them through.
pub async fn suggest(
    geocoder: &dyn Geocoder,
    address: &str,
    country: Option<&str>,
    limit: u32,
) -> Result<Vec<GeocodeResult>, AppError> {
    let Some(country) = country.filter(|_| should_suggest(address, country)) else {
        return Ok(Vec::new());
    };

    let filter = upstream_filter(country);
    let candidates = geocoder
        .search(address.trim(), filter.as_deref(), limit)
        .await?;

    Ok(candidates
        .into_iter()
        .filter(|c| country_matches(country, &c.country_code))
        .collect())
}

// ── Debounced autocomplete ──────────────────────────────────────────

/// Debounces keystrokes into suggestion lookups.
///
/// `GET /api/geocode/suggest` is stateless and answers every call, so
/// debouncing belongs to whoever owns the text field. This is that owner's
/// half for Rust front-ends that embed the crate: one instance per field,
/// fed on every keystroke.
///
/// Each call to [`AddressAutocomplete::input`] supersedes the previous one.
/// A lookup only runs after `SUGGEST_DEBOUNCE_MS` without newer input, and
/// its result is discarded if newer input arrived while it was in flight.
pub struct AddressAutocomplete {
    geocoder: Arc<dyn Geocoder>,
    limit: u32,
    delay: Duration,
    generation: AtomicU64,
}

impl AddressAutocomplete {
    pub fn new(geocoder: Arc<dyn Geocoder>, limit: u32) -> Self {
        Self {
            geocoder,
            limit,
            delay: Duration::from_millis(SUGGEST_DEBOUNCE_MS),
            generation: AtomicU64::new(0),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Register new input. Resolves to `None` when superseded, otherwise to
    /// the suggestions for this input.
    pub async fn input(
        &self,
        address: &str,
        country: Option<&str>,
    ) -> Option<Result<Vec<GeocodeResult>, AppError>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !should_suggest(address, country) {
            return Some(Ok(Vec::new()));
        }

        tokio::time::sleep(self.delay).await;
        if !self.is_current(generation) {
            return None;
        }

        let result = suggest(self.geocoder.as_ref(), address, country, self.limit).await;
        self.is_current(generation).then_some(result)
    }
}

// ── Nominatim client ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    region: Option<String>,
    postcode: Option<String>,
    country_code: Option<String>,
}

impl NominatimPlace {
    fn into_result(self) -> Option<GeocodeResult> {
        let latitude = self.lat.parse().ok()?;
        let longitude = self.lon.parse().ok()?;
        let a = self.address;
        Some(GeocodeResult {
            latitude,
            longitude,
            city: a.city.or(a.town).or(a.village),
            region: a.state.or(a.region),
            postal_code: a.postcode,
            display_name: self.display_name,
            country_code: a.country_code.map(|c| c.to_ascii_uppercase()).unwrap_or_default(),
        })
    }
}

/// HTTP client for the Nominatim `/search` endpoint.
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl NominatimClient {
    pub fn new(settings: &GeocodingSettings) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build geocoding client: {e}")))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            language: settings.language.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(
        &self,
        address: &str,
        country: Option<&str>,
        limit: u32,
    ) -> Result<Vec<GeocodeResult>, AppError> {
        let mut query: Vec<(&str, String)> = vec![
            ("format", "jsonv2".to_string()),
            ("addressdetails", "1".to_string()),
            ("q", address.to_string()),
            ("accept-language", self.language.clone()),
            ("limit", limit.to_string()),
        ];
        if let Some(code) = country {
            query.push(("countrycodes", code.to_ascii_lowercase()));
        }

        let resp = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "geocoding request failed");
                AppError::upstream(format!("Geocoding request failed: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "geocoding returned an error status");
            return Err(AppError::upstream(format!("Geocoding failed with status {status}")));
        }

        let places: Vec<NominatimPlace> = resp
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid geocoding response: {e}")))?;

        Ok(places
            .into_iter()
            .filter_map(NominatimPlace::into_result)
            .collect())
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::LatLng;
use crate::complaint::ComplaintPriority;

/// A rectangle in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// The whole globe; panning never leaves this rectangle.
    pub const EARTH: Bounds = Bounds {
        south: -90.0,
        west: -180.0,
        north: 90.0,
        east: 180.0,
    };

    pub fn contains(&self, p: LatLng) -> bool {
        (self.south..=self.north).contains(&p.latitude)
            && (self.west..=self.east).contains(&p.longitude)
    }
}

/// One pin on the violations map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MapMarker {
    pub complaint_id: Uuid,
    pub position: LatLng,
    pub title: String,
    pub priority: ComplaintPriority,
    /// CSS colour of the pin.
    pub color: String,
    /// Extra glyph drawn on the pin (critical complaints only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    /// Target of the popup's "view details" action.
    pub details_path: String,
}

/// How the client should frame the markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Viewport {
    /// Fit the bounding box of the markers.
    FitBounds { bounds: Bounds, padding_px: u32 },
    /// Centre on a single marker at a fixed zoom.
    Center { center: LatLng, zoom: u8 },
    /// Nothing to show: default world view.
    World { center: LatLng, zoom: u8 },
}

/// Body of `GET /api/map/complaints`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MapView {
    pub markers: Vec<MapMarker>,
    pub viewport: Viewport,
    /// Pan limit handed to the tile renderer.
    pub max_bounds: Bounds,
}

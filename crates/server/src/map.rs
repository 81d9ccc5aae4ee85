//! Projection of published complaints onto the violations map.

use shared_types::{
    AppError, Bounds, Complaint, ComplaintFilters, ComplaintPriority, ComplaintStatus, LatLng,
    MapMarker, MapView, Viewport,
};

use crate::repo::ComplaintStore;

pub const CRITICAL_COLOR: &str = "#8B0000";
pub const HIGH_COLOR: &str = "#FF8C00";
pub const NORMAL_COLOR: &str = "#FFD700";
pub const CRITICAL_BADGE: &str = "!";

/// Padding around fitted bounds, in pixels.
pub const FIT_PADDING_PX: u32 = 50;
/// Zoom used when a single marker is shown.
pub const SINGLE_MARKER_ZOOM: u8 = 13;
pub const WORLD_CENTER: LatLng = LatLng {
    latitude: 20.0,
    longitude: 0.0,
};
pub const WORLD_ZOOM: u8 = 2;

/// Pin colour and badge for a priority.
pub fn marker_style(priority: ComplaintPriority) -> (&'static str, Option<&'static str>) {
    match priority {
        ComplaintPriority::Critical => (CRITICAL_COLOR, Some(CRITICAL_BADGE)),
        ComplaintPriority::High => (HIGH_COLOR, None),
        ComplaintPriority::Normal => (NORMAL_COLOR, None),
    }
}

/// Marker for a published complaint with usable coordinates.
pub fn marker_for(complaint: &Complaint) -> Option<MapMarker> {
    if complaint.status != ComplaintStatus::Published {
        return None;
    }
    let position = complaint.position()?;
    let priority = complaint.priority.unwrap_or(ComplaintPriority::Normal);
    let (color, badge) = marker_style(priority);
    Some(MapMarker {
        complaint_id: complaint.id,
        position,
        title: complaint.title.clone(),
        priority,
        color: color.to_string(),
        badge: badge.map(str::to_string),
        details_path: format!("/complaints/{}", complaint.id),
    })
}

/// Frame the markers: fit all of them, centre on a lone one, or show the
/// world when there is nothing to show.
pub fn viewport(markers: &[MapMarker]) -> Viewport {
    match markers {
        [] => Viewport::World {
            center: WORLD_CENTER,
            zoom: WORLD_ZOOM,
        },
        [only] => Viewport::Center {
            center: only.position,
            zoom: SINGLE_MARKER_ZOOM,
        },
        _ => {
            let mut b = Bounds {
                south: f64::MAX,
                west: f64::MAX,
                north: f64::MIN,
                east: f64::MIN,
            };
            for m in markers {
                b.south = b.south.min(m.position.latitude);
                b.north = b.north.max(m.position.latitude);
                b.west = b.west.min(m.position.longitude);
                b.east = b.east.max(m.position.longitude);
            }
            Viewport::FitBounds {
                bounds: b,
                padding_px: FIT_PADDING_PX,
            }
        }
    }
}

/// Clamp a requested map centre to the pan limits.
///
/// The server never pans; [`MapView::max_bounds`] carries the limits to the
/// browser. Embedding front-ends apply them with this.
pub fn clamp_to(bounds: &Bounds, p: LatLng) -> LatLng {
    LatLng::new(
        p.latitude.clamp(bounds.south, bounds.north),
        p.longitude.clamp(bounds.west, bounds.east),
    )
}

/// Markers and framing for the published complaints matching `filters`.
pub async fn map_view(
    store: &dyn ComplaintStore,
    filters: &ComplaintFilters,
) -> Result<MapView, AppError> {
    let filters = ComplaintFilters {
        status: Some(ComplaintStatus::Published),
        ..filters.clone()
    };
    let markers: Vec<MapMarker> = store.list(&filters).await?.iter().filter_map(marker_for).collect();
    Ok(MapView {
        viewport: viewport(&markers),
        markers,
        max_bounds: Bounds::EARTH,
    })
}

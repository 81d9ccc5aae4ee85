use axum::{
    extract::{Query, State},
    Json,
};

use shared_types::{AppError, ComplaintFilters, MapView};

use crate::db::AppState;

/// Markers and initial framing for published complaints. `status` in the
/// query is ignored.
#[utoipa::path(
    get,
    path = "/api/map/complaints",
    params(ComplaintFilters),
    responses(
        (status = 200, description = "Map markers and viewport", body = MapView)
    ),
    tag = "map"
)]
pub async fn map_complaints(
    State(state): State<AppState>,
    Query(filters): Query<ComplaintFilters>,
) -> Result<Json<MapView>, AppError> {
    Ok(Json(crate::map::map_view(state.complaints.as_ref(), &filters).await?))
}

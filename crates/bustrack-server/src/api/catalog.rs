//! Zone and route catalogs.

use axum::extract::State;
use axum::Json;
use bustrack_core::{Route, Zone};

use crate::state::AppState;

/// List geofence zones.
#[utoipa::path(
    get,
    path = "/api/zones",
    tag = "catalog",
    operation_id = "listZones",
    summary = "List geofence zones",
    description = "Returns the zones checked on every position report, in evaluation order.",
    responses(
        (status = 200, description = "Zone catalog", body = Vec<Zone>)
    )
)]
pub async fn list_zones(State(state): State<AppState>) -> Json<Vec<Zone>> {
    Json(state.config().zones.clone())
}

/// List routes.
#[utoipa::path(
    get,
    path = "/api/routes",
    tag = "catalog",
    operation_id = "listRoutes",
    summary = "List routes",
    description = "Returns the display-only route catalog. Route ids are not \
        checked when a vehicle logs in.",
    responses(
        (status = 200, description = "Route catalog", body = Vec<Route>)
    )
)]
pub async fn list_routes(State(state): State<AppState>) -> Json<Vec<Route>> {
    Json(state.config().routes.clone())
}

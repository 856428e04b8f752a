//! Read-only view of the vehicle registry.
//!
//! WebSocket subscribers get the same data pushed to them; these endpoints
//! are for clients that only need a point-in-time look.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use bustrack_core::{SessionId, TrackerError, VehicleSession};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::error::ApiResult;
use crate::state::AppState;

/// Creates the vehicles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles))
        .route("/{session_id}", get(get_vehicle))
}

/// Query parameters for the vehicle list.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct VehicleListQuery {
    /// Only include vehicles serving this route.
    #[param(example = "ROUTE_101")]
    pub route_id: Option<String>,
}

/// List active vehicles.
#[utoipa::path(
    get,
    path = "/api/vehicles",
    tag = "vehicles",
    operation_id = "listVehicles",
    summary = "List active vehicles",
    description = "Returns every logged-in vehicle with its last reported position, \
        in no particular order. Vehicles that have not yet reported sit at (0, 0).",
    params(VehicleListQuery),
    responses(
        (status = 200, description = "Current snapshot", body = Vec<VehicleSession>)
    )
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> Json<Vec<VehicleSession>> {
    let mut vehicles = state.registry().snapshot();
    if let Some(route_id) = query.route_id {
        vehicles.retain(|v| v.route_id == route_id);
    }
    Json(vehicles)
}

/// Look up one vehicle by session id.
#[utoipa::path(
    get,
    path = "/api/vehicles/{session_id}",
    tag = "vehicles",
    operation_id = "getVehicle",
    summary = "Get one vehicle",
    params(
        ("session_id" = String, Path, description = "Session id from the snapshot's `id` field")
    ),
    responses(
        (status = 200, description = "Vehicle found", body = VehicleSession),
        (status = 404, description = "No vehicle for this session", body = super::error::ErrorResponse)
    )
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<VehicleSession>> {
    let session_id = SessionId::from(session_id);
    state
        .registry()
        .get(&session_id)
        .map(Json)
        .ok_or_else(|| TrackerError::UnknownSession(session_id).into())
}

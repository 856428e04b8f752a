//! OpenAPI specification for the bustrack HTTP API.
//!
//! The WebSocket protocol at `/ws` is described in the document's
//! introduction; only the HTTP endpoints are modelled as paths.

use axum::Json;
use bustrack_core::{AlertEvent, AlertKind, Occupancy, Route, VehicleSession, Zone};
use utoipa::OpenApi;

use super::error::ErrorResponse;
use super::health::HealthResponse;

/// Serve the OpenAPI specification as JSON.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as a pretty-printed string.
/// Used by the gen-openapi binary.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for bustrack.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "bustrack API",
        version = "0.1.0",
        description = r#"
# bustrack API

Live bus positions and geofence arrival alerts.

## WebSocket

Connect to `/ws`. Every frame is a JSON object with a `type` field.

- Drivers send `login` (`vehicleId`, `routeId`) once, then `position`
  (`latitude`, `longitude`, `speedKmh`, `occupancy`) as often as they like.
- Any client may send `snapshot_request` to receive the current vehicle list.
- The server pushes `snapshot` (full vehicle list) after every change and
  `alert` when a vehicle arrives in a zone. Undecodable frames are answered
  with `error` to the sender only.

## HTTP

The endpoints below are read-only views of the same state.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local bustrack server")
    ),
    tags(
        (name = "system", description = "Health checks"),
        (name = "vehicles", description = "Active vehicles and their last known position"),
        (name = "catalog", description = "Geofence zones and display routes")
    ),
    paths(
        super::health::health_check,
        super::vehicles::list_vehicles,
        super::vehicles::get_vehicle,
        super::catalog::list_zones,
        super::catalog::list_routes,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            VehicleSession,
            Occupancy,
            AlertEvent,
            AlertKind,
            Zone,
            Route,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "bustrack API");
        assert!(spec.paths.paths.contains_key("/api/vehicles"));
        assert!(spec.paths.paths.contains_key("/api/vehicles/{session_id}"));
    }

    #[test]
    fn test_openapi_json_serialization() {
        let json = get_openapi_json().unwrap();
        assert!(json.contains("\"openapi\":"));
        assert!(json.contains("\"bustrack API\""));
        assert!(json.contains("VehicleSession"));
    }
}

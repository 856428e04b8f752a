//! Health check API endpoint.
//!
//! Provides a simple health check endpoint for monitoring and load balancers.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "status": "ok",
    "version": "0.1.0",
    "active_vehicles": 3,
    "subscribers": 12,
    "uptime_secs": 86400
}))]
pub struct HealthResponse {
    /// Service status.
    #[schema(example = "ok")]
    pub status: String,

    /// Service version from Cargo.toml.
    #[schema(example = "0.1.0")]
    pub version: String,

    /// Vehicles currently logged in.
    #[schema(example = 3, minimum = 0)]
    pub active_vehicles: usize,

    /// Open WebSocket connections, publishers included.
    #[schema(example = 12, minimum = 0)]
    pub subscribers: usize,

    /// Seconds since the server started.
    #[schema(example = 86400, minimum = 0)]
    pub uptime_secs: u64,
}

/// Creates the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    operation_id = "healthCheck",
    summary = "Check service health",
    description = "Returns service status with the number of active vehicles and \
        connected clients. Use this endpoint for load balancer health checks.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_vehicles: state.registry().len(),
        subscribers: state.hub().connection_count().await,
        uptime_secs: state.uptime().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            active_vehicles: 2,
            subscribers: 5,
            uptime_secs: 10,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"active_vehicles\":2"));
    }

    #[tokio::test]
    async fn test_health_check_counts() {
        let state = AppState::default();
        let Json(body) = health_check(State(state)).await;
        assert_eq!(body.active_vehicles, 0);
        assert_eq!(body.subscribers, 0);
    }
}

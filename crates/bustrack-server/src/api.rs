//! HTTP API routes and handlers.
//!
//! This module contains all HTTP endpoint implementations organized by domain:
//! - `health` - Service health checks
//! - `vehicles` - Active vehicle snapshot
//! - `catalog` - Zone and route catalogs
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ws;

pub mod catalog;
pub mod error;
pub mod health;
pub mod openapi;
pub mod vehicles;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use openapi::get_openapi_json;

/// Creates the combined router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                - Health check
/// /ws                    - WebSocket for drivers and viewers
/// /api
/// ├── /vehicles          - Current snapshot
/// ├── /vehicles/{id}     - One vehicle
/// ├── /zones             - Geofence zones
/// ├── /routes            - Route catalog
/// └── /openapi.json      - OpenAPI specification
/// ```
///
/// CORS accepts any origin.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/vehicles", vehicles::router())
        .route("/zones", get(catalog::list_zones))
        .route("/routes", get(catalog::list_routes))
        .route("/openapi.json", get(openapi::get_openapi_spec))
        .layer(CompressionLayer::new());

    Router::new()
        .nest("/health", health::router())
        .route("/ws", get(ws::ws_handler))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

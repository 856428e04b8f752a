//! # bustrack-core
//!
//! Core logic for the bustrack real-time vehicle tracking server.
//!
//! This crate provides:
//! - An in-memory registry of vehicles publishing their position
//! - Geofence arrival detection with hysteresis
//! - The WebSocket wire protocol shared by publishers and subscribers
//! - Configuration for zones, routes and the listener
//!
//! Nothing here performs network I/O; the server crate wires these pieces to
//! connections.
//!
//! ## Architecture
//!
//! - [`geo`] - Haversine distance
//! - [`zones`] - Static catalog of circular zones
//! - [`routes`] - Display-only route catalog
//! - [`registry`] - Vehicle sessions keyed by connection
//! - [`geofence`] - Per-vehicle arrival state machine
//! - [`protocol`] - Client and server frames
//! - [`config`] - Layered configuration loading and validation
//! - [`error`] - Unified error types for the crate
//! - [`types`] - Shared types and OpenAPI schemas

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod geo;
pub mod geofence;
pub mod protocol;
pub mod registry;
pub mod routes;
pub mod types;
pub mod zones;

// Re-export primary types for convenience
pub use config::{AppConfig, ConfigError, ConfigResult, GeofenceConfig, ServerConfig};
pub use error::{Result, TrackerError};
pub use geo::{haversine_km, Coordinate, EARTH_RADIUS_KM};
pub use geofence::GeofenceEvaluator;
pub use protocol::{ClientMessage, ServerMessage};
pub use registry::{PositionReport, PositionUpdate, VehicleRegistry, VehicleSession};
pub use routes::Route;
pub use types::{AlertEvent, AlertKind, Occupancy, SessionId};
pub use zones::{Zone, ZoneCatalog};

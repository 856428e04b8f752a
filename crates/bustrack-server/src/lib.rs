//! # bustrack-server
//!
//! WebSocket and HTTP server for the bustrack vehicle tracking system.
//!
//! Drivers publish positions over `/ws`; every connected client receives the
//! resulting vehicle snapshots and geofence alerts. A small read-only REST
//! API exposes the same state.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
pub mod tracker;
pub mod ws;

pub use api::create_router;
pub use state::AppState;
pub use tracker::Tracker;

//! Application state shared across handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bustrack_core::{AppConfig, GeofenceEvaluator, VehicleRegistry};

use crate::tracker::Tracker;
use crate::ws::hub::BroadcastHub;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    tracker: Tracker,
    started_at: Instant,
}

impl AppState {
    /// Build state from a validated configuration.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let evaluator = GeofenceEvaluator::new(
            Arc::new(config.zone_catalog()),
            config.geofence.hysteresis_km,
        );
        let tracker = Tracker::new(
            Arc::new(VehicleRegistry::new()),
            Arc::new(evaluator),
            Arc::new(BroadcastHub::new()),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                tracker,
                started_at: Instant::now(),
            }),
        }
    }

    /// Configuration the server was started with.
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Event dispatcher.
    pub fn tracker(&self) -> &Tracker {
        &self.inner.tracker
    }

    /// Vehicle registry.
    pub fn registry(&self) -> &VehicleRegistry {
        self.inner.tracker.registry()
    }

    /// Broadcast hub.
    pub fn hub(&self) -> &BroadcastHub {
        self.inner.tracker.hub()
    }

    /// Time since the state was created.
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

//! Zone arrival detection with hysteresis.
//!
//! For each position update every zone is checked in catalog order:
//!
//! ```text
//!            inside              band                 outside
//!   |-------- d <= r --------|-- r < d <= r+h --|------ d > r+h ------>
//!   alert once, mark current     no change          clear if current
//! ```
//!
//! A vehicle carries a single `current_zone_name`. When zones overlap, the
//! last matching zone in catalog order wins, and the vehicle will re-alert
//! between overlapping zones on consecutive reports.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::DEFAULT_HYSTERESIS_KM;
use crate::registry::VehicleSession;
use crate::types::AlertEvent;
use crate::zones::ZoneCatalog;

/// Evaluates vehicle positions against a zone catalog.
#[derive(Debug, Clone)]
pub struct GeofenceEvaluator {
    catalog: Arc<ZoneCatalog>,
    hysteresis_km: f64,
}

impl GeofenceEvaluator {
    /// Create an evaluator over `catalog` with the given exit margin.
    #[must_use]
    pub const fn new(catalog: Arc<ZoneCatalog>, hysteresis_km: f64) -> Self {
        Self {
            catalog,
            hysteresis_km,
        }
    }

    /// Evaluator with the default 0.2 km exit margin.
    #[must_use]
    pub const fn with_default_hysteresis(catalog: Arc<ZoneCatalog>) -> Self {
        Self::new(catalog, DEFAULT_HYSTERESIS_KM)
    }

    /// Zones this evaluator checks.
    #[must_use]
    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    /// Exit margin in kilometres.
    #[must_use]
    pub const fn hysteresis_km(&self) -> f64 {
        self.hysteresis_km
    }

    /// Check `session`'s current position against every zone, updating its
    /// zone state in place. Returns one arrival alert per zone newly entered.
    /// Inside two overlapping zones this emits two alerts on every report.
    pub fn evaluate(&self, session: &mut VehicleSession, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let position = session.position();
        let mut alerts = Vec::new();

        for zone in self.catalog.iter() {
            let distance = zone.distance_km(&position);
            let is_current = session.current_zone_name.as_deref() == Some(zone.name.as_str());

            if distance <= zone.radius_km {
                if !is_current {
                    info!(
                        session_id = %session.session_id,
                        vehicle_id = %session.vehicle_id,
                        zone = %zone.name,
                        distance_km = distance,
                        "vehicle entered zone"
                    );
                    alerts.push(AlertEvent::arrival(&session.vehicle_id, &zone.name, now));
                    session.current_zone_name = Some(zone.name.clone());
                }
            } else if is_current && distance > zone.radius_km + self.hysteresis_km {
                debug!(
                    session_id = %session.session_id,
                    zone = %zone.name,
                    distance_km = distance,
                    "vehicle left zone"
                );
                session.current_zone_name = None;
            }
        }

        alerts
    }
}

//! In-memory registry of active vehicle sessions.
//!
//! One [`VehicleSession`] exists per logged-in publisher connection, keyed by
//! that connection's [`SessionId`]. The registry is the only owner of session
//! records; callers get clones.
//!
//! Every mutation replaces a whole record under the write lock, so a
//! concurrent [`VehicleRegistry::snapshot`] never observes a half-applied
//! position report.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{Result, TrackerError};
use crate::geo::Coordinate;
use crate::geofence::GeofenceEvaluator;
use crate::types::{AlertEvent, Occupancy, SessionId};

/// Live state of one publishing vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "0193a5b2-7c1e-7d4f-9a6b-2f0e5c8d1a34",
    "vehicleId": "TS09-1234",
    "routeId": "ROUTE_101",
    "latitude": 17.4399,
    "longitude": 78.4983,
    "speed": 32.5,
    "occupancy": "Medium",
    "lastUpdateTimestamp": 1_760_870_400_000_i64,
    "currentZone": null
}))]
pub struct VehicleSession {
    /// Connection the vehicle is publishing on.
    #[serde(rename = "id")]
    pub session_id: SessionId,

    /// Caller-supplied vehicle label. Not unique across sessions.
    pub vehicle_id: String,

    /// Caller-supplied route id.
    pub route_id: String,

    /// Last reported latitude in degrees (0 until the first report).
    pub latitude: f64,

    /// Last reported longitude in degrees (0 until the first report).
    pub longitude: f64,

    /// Last reported speed in km/h.
    pub speed: f64,

    /// Last reported passenger load.
    pub occupancy: Occupancy,

    /// When the record last changed (milliseconds since the Unix epoch on the wire).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub last_update_timestamp: DateTime<Utc>,

    /// Zone the vehicle is currently considered inside, if any.
    #[serde(rename = "currentZone")]
    pub current_zone_name: Option<String>,
}

impl VehicleSession {
    /// A freshly logged-in vehicle with the sentinel position (0, 0).
    #[must_use]
    pub fn new(session_id: SessionId, vehicle_id: String, route_id: String) -> Self {
        Self {
            session_id,
            vehicle_id,
            route_id,
            latitude: 0.0,
            longitude: 0.0,
            speed: 0.0,
            occupancy: Occupancy::Low,
            last_update_timestamp: Utc::now(),
            current_zone_name: None,
        }
    }

    /// Last reported position.
    #[must_use]
    pub const fn position(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Overwrite the telemetry fields from `report` and stamp the record.
    fn apply(&mut self, report: &PositionReport, now: DateTime<Utc>) {
        self.latitude = report.latitude;
        self.longitude = report.longitude;
        self.speed = report.speed_kmh;
        self.occupancy = report.occupancy.unwrap_or_default();
        self.last_update_timestamp = now;
    }
}

/// Telemetry carried by one position report.
///
/// Values are taken as-is; out-of-range coordinates are not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    /// Latitude in degrees.
    #[serde(alias = "lat")]
    pub latitude: f64,

    /// Longitude in degrees.
    #[serde(alias = "lon")]
    pub longitude: f64,

    /// Speed in km/h.
    #[serde(alias = "speed", default)]
    pub speed_kmh: f64,

    /// Passenger load; `Low` when omitted.
    #[serde(default)]
    pub occupancy: Option<Occupancy>,
}

impl PositionReport {
    /// Report at `(latitude, longitude)` with zero speed and no occupancy.
    #[must_use]
    pub const fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            speed_kmh: 0.0,
            occupancy: None,
        }
    }
}

/// Result of applying a position report and evaluating geofences.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    /// The record after the update.
    pub session: VehicleSession,

    /// Alerts raised by this update, in zone order.
    pub alerts: Vec<AlertEvent>,
}

/// Concurrency-safe store of active vehicle sessions.
#[derive(Debug, Default)]
pub struct VehicleRegistry {
    sessions: RwLock<HashMap<SessionId, VehicleSession>>,
}

impl VehicleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a publisher. Re-registering a session id replaces the prior
    /// record, including its zone state.
    pub fn register_vehicle(
        &self,
        session_id: SessionId,
        vehicle_id: impl Into<String>,
        route_id: impl Into<String>,
    ) -> VehicleSession {
        let session = VehicleSession::new(session_id.clone(), vehicle_id.into(), route_id.into());
        let replaced = self
            .sessions
            .write()
            .insert(session_id, session.clone())
            .is_some();
        debug!(
            session_id = %session.session_id,
            vehicle_id = %session.vehicle_id,
            route_id = %session.route_id,
            replaced,
            "vehicle registered"
        );
        session
    }

    /// Apply a position report without geofence evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::UnknownSession`] if no vehicle is registered
    /// under `session_id`.
    pub fn update_position(
        &self,
        session_id: &SessionId,
        report: &PositionReport,
    ) -> Result<VehicleSession> {
        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| TrackerError::UnknownSession(session_id.clone()))?;

        let mut next = entry.clone();
        next.apply(report, Utc::now());
        *entry = next.clone();
        Ok(next)
    }

    /// Apply a position report and run `evaluator` against the new position
    /// inside the same critical section, so that zone state always matches
    /// the position it was derived from.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::UnknownSession`] if no vehicle is registered
    /// under `session_id`.
    pub fn update_and_evaluate(
        &self,
        session_id: &SessionId,
        report: &PositionReport,
        evaluator: &GeofenceEvaluator,
    ) -> Result<PositionUpdate> {
        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| TrackerError::UnknownSession(session_id.clone()))?;

        let now = Utc::now();
        let mut next = entry.clone();
        next.apply(report, now);
        let alerts = evaluator.evaluate(&mut next, now);
        *entry = next.clone();

        Ok(PositionUpdate {
            session: next,
            alerts,
        })
    }

    /// Remove a session. Returns whether anything was removed.
    pub fn remove_session(&self, session_id: &SessionId) -> bool {
        let removed = self.sessions.write().remove(session_id);
        if let Some(session) = &removed {
            debug!(session_id = %session_id, vehicle_id = %session.vehicle_id, "vehicle removed");
        }
        removed.is_some()
    }

    /// Look up one session.
    #[must_use]
    pub fn get(&self, session_id: &SessionId) -> Option<VehicleSession> {
        self.sessions.read().get(session_id).cloned()
    }

    /// All current sessions, in no particular order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<VehicleSession> {
        self.sessions.read().values().cloned().collect()
    }

    /// Number of registered vehicles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no vehicles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

//! Shared types and OpenAPI schemas.
//!
//! Types used by more than one module live here. The registry record itself
//! is defined in [`crate::registry`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque identity of one client connection.
///
/// A publisher's registry entry is keyed by the id of the connection it
/// logged in on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "0193a5b2-7c1e-7d4f-9a6b-2f0e5c8d1a34")]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh, time-ordered session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Passenger load reported by a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Occupancy {
    /// Plenty of seats.
    #[default]
    Low,
    /// Standing room.
    Medium,
    /// Full.
    High,
}

/// Kind of geofence alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// The vehicle entered a zone it was not previously inside.
    Arrival,
}

/// A one-shot geofence alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "vehicleId": "TS09-1234",
    "zoneName": "Depot",
    "message": "Bus TS09-1234 has arrived at Depot",
    "eventType": "arrival",
    "timestamp": 1_760_870_400_000_i64
}))]
pub struct AlertEvent {
    /// Label of the vehicle that triggered the alert.
    pub vehicle_id: String,

    /// Zone that was entered.
    pub zone_name: String,

    /// Human-readable message.
    pub message: String,

    /// Alert kind.
    pub event_type: AlertKind,

    /// When the alert was raised (milliseconds since the Unix epoch on the wire).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[schema(value_type = i64)]
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    /// Build an arrival alert for `vehicle_id` entering `zone_name`.
    #[must_use]
    pub fn arrival(vehicle_id: &str, zone_name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            zone_name: zone_name.to_string(),
            message: format!("Bus {vehicle_id} has arrived at {zone_name}"),
            event_type: AlertKind::Arrival,
            timestamp,
        }
    }
}

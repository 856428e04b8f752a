//! WebSocket wire protocol.
//!
//! Every frame is a JSON object tagged by `type`.
//!
//! Publisher → server:
//! - `{"type": "login", "vehicleId": "...", "routeId": "..."}`
//! - `{"type": "position", "latitude": 17.4, "longitude": 78.4, "speedKmh": 30, "occupancy": "Low"}`
//!
//! Subscriber → server:
//! - `{"type": "snapshot_request"}`
//!
//! Server → clients:
//! - `{"type": "snapshot", "vehicles": [...]}` - full registry, replaces the client's view
//! - `{"type": "alert", ...}` - one geofence alert
//! - `{"type": "error", "code": "...", "message": "..."}` - only to the sender of a bad frame
//!
//! The legacy event names `driver_login`, `driver_location` and
//! `request_buses` are accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::registry::{PositionReport, VehicleSession};
use crate::types::AlertEvent;

/// Frames sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A publisher announces itself.
    #[serde(alias = "driver_login", rename_all = "camelCase")]
    Login {
        /// Vehicle label.
        #[serde(alias = "busId")]
        vehicle_id: String,
        /// Route the vehicle is serving.
        route_id: String,
    },

    /// A publisher reports its telemetry.
    #[serde(alias = "driver_location")]
    Position(PositionReport),

    /// A subscriber asks for the current snapshot.
    #[serde(alias = "request_buses")]
    SnapshotRequest,
}

impl ClientMessage {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MalformedInput`] if the frame is not a known
    /// message or a required field is missing or of the wrong JSON type.
    pub fn parse(text: &str) -> Result<Self, TrackerError> {
        serde_json::from_str(text).map_err(|e| TrackerError::MalformedInput(e.to_string()))
    }
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full list of active vehicles.
    Snapshot {
        /// Every registered vehicle, in no particular order.
        vehicles: Vec<VehicleSession>,
    },

    /// A geofence alert.
    Alert(AlertEvent),

    /// The last frame from this client could not be handled.
    Error {
        /// Machine-readable error code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}

impl ServerMessage {
    /// Error frame describing `err`.
    #[must_use]
    pub fn from_error(err: &TrackerError) -> Self {
        Self::Error {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }

    /// Short name of the frame type, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => "snapshot",
            Self::Alert(_) => "alert",
            Self::Error { .. } => "error",
        }
    }

    /// Encode as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, TrackerError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::types::{Occupancy, SessionId};

    #[test]
    fn test_parse_login() {
        let msg = ClientMessage::parse(r#"{"type":"login","vehicleId":"BUS-1","routeId":"ROUTE_101"}"#)
            .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Login {
                vehicle_id: "BUS-1".into(),
                route_id: "ROUTE_101".into(),
            }
        );
    }

    #[test]
    fn test_parse_legacy_login() {
        let msg =
            ClientMessage::parse(r#"{"type":"driver_login","busId":"BUS-1","routeId":"R"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Login { ref vehicle_id, .. } if vehicle_id == "BUS-1"));
    }

    #[test]
    fn test_parse_position_with_optional_occupancy() {
        let msg = ClientMessage::parse(
            r#"{"type":"position","latitude":17.4,"longitude":78.47,"speedKmh":25.5}"#,
        )
        .unwrap();
        let ClientMessage::Position(report) = msg else {
            panic!("expected a position report");
        };
        assert!((report.speed_kmh - 25.5).abs() < f64::EPSILON);
        assert!(report.occupancy.is_none());

        let msg = ClientMessage::parse(
            r#"{"type":"driver_location","lat":1,"lon":2,"speed":3,"occupancy":"High"}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Position(PositionReport { occupancy: Some(Occupancy::High), .. })
        ));
    }

    #[test]
    fn test_parse_out_of_range_coordinates_pass_through() {
        let msg =
            ClientMessage::parse(r#"{"type":"position","latitude":123.0,"longitude":-999.0}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Position(r) if (r.latitude - 123.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_parse_snapshot_request() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"snapshot_request"}"#).unwrap(),
            ClientMessage::SnapshotRequest
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"request_buses"}"#).unwrap(),
            ClientMessage::SnapshotRequest
        );
    }

    #[test]
    fn test_parse_rejects_malformed_frames() {
        for frame in [
            "",
            "not json",
            r#"{"type":"teleport"}"#,
            r#"{"type":"position","latitude":"north","longitude":1}"#,
            r#"{"type":"login","vehicleId":"BUS-1"}"#,
        ] {
            let err = ClientMessage::parse(frame).unwrap_err();
            assert!(matches!(err, TrackerError::MalformedInput(_)), "frame {frame:?}");
        }
    }

    #[test]
    fn test_snapshot_frame_shape() {
        let mut session = VehicleSession::new(SessionId::from("s1"), "BUS-1".into(), "R".into());
        session.last_update_timestamp = DateTime::from_timestamp_millis(42).unwrap();
        let json: serde_json::Value = serde_json::from_str(
            &ServerMessage::Snapshot {
                vehicles: vec![session],
            }
            .to_json()
            .unwrap(),
        )
        .unwrap();

        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["vehicles"][0]["vehicleId"], "BUS-1");
        assert_eq!(json["vehicles"][0]["lastUpdateTimestamp"], 42);
    }

    #[test]
    fn test_alert_frame_is_flattened() {
        let alert = AlertEvent::arrival("BUS-1", "Depot", DateTime::from_timestamp_millis(7).unwrap());
        let msg = ServerMessage::Alert(alert);
        assert_eq!(msg.kind(), "alert");

        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "alert");
        assert_eq!(json["eventType"], "arrival");
        assert_eq!(json["zoneName"], "Depot");
    }

    #[test]
    fn test_error_frame_from_tracker_error() {
        let msg = ServerMessage::from_error(&TrackerError::MalformedInput("eof".into()));
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "MALFORMED_INPUT");
    }
}

//! Event handling between connections, the registry and the hub.
//!
//! Each inbound frame maps to one operation here. Operations update the
//! registry first and then fan out the resulting snapshot and alerts, so a
//! snapshot always reflects the update that triggered it.

use std::sync::Arc;

use bustrack_core::{
    ClientMessage, GeofenceEvaluator, PositionReport, ServerMessage, SessionId, VehicleRegistry,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ws::hub::BroadcastHub;

/// Dispatches client events.
#[derive(Debug, Clone)]
pub struct Tracker {
    registry: Arc<VehicleRegistry>,
    evaluator: Arc<GeofenceEvaluator>,
    hub: Arc<BroadcastHub>,
    /// Held from a registry mutation until its snapshot is queued, so every
    /// connection receives snapshots in registry order.
    fanout: Arc<Mutex<()>>,
}

impl Tracker {
    /// Create a tracker over shared state.
    #[must_use]
    pub fn new(
        registry: Arc<VehicleRegistry>,
        evaluator: Arc<GeofenceEvaluator>,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self {
            registry,
            evaluator,
            hub,
            fanout: Arc::new(Mutex::new(())),
        }
    }

    /// Vehicle registry.
    #[must_use]
    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    /// Broadcast hub.
    #[must_use]
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Decode and handle one text frame from connection `from`.
    ///
    /// A frame that cannot be decoded is answered with an error frame to the
    /// sender only; nothing else changes.
    pub async fn handle_frame(&self, from: &SessionId, text: &str) {
        match ClientMessage::parse(text) {
            Ok(message) => self.handle(from, message).await,
            Err(e) => {
                debug!(conn_id = %from, error = %e, "malformed frame");
                if let Err(send_err) = self.hub.send_to(from, &ServerMessage::from_error(&e)).await {
                    debug!(conn_id = %from, error = %send_err, "could not deliver error frame");
                }
            }
        }
    }

    /// Handle one decoded message from connection `from`.
    pub async fn handle(&self, from: &SessionId, message: ClientMessage) {
        match message {
            ClientMessage::Login {
                vehicle_id,
                route_id,
            } => self.on_publisher_login(from, &vehicle_id, &route_id).await,
            ClientMessage::Position(report) => self.on_position_report(from, &report).await,
            ClientMessage::SnapshotRequest => self.on_subscriber_snapshot_request(from).await,
        }
    }

    /// Register `session_id` as a publisher and broadcast the new snapshot.
    pub async fn on_publisher_login(&self, session_id: &SessionId, vehicle_id: &str, route_id: &str) {
        let _fanout = self.fanout.lock().await;
        let _ = self
            .registry
            .register_vehicle(session_id.clone(), vehicle_id, route_id);
        info!(session_id = %session_id, vehicle_id, route_id, "publisher logged in");
        self.hub.broadcast_snapshot(self.registry.snapshot()).await;
    }

    /// Apply a position report, broadcast the snapshot, then broadcast any
    /// alerts the update raised.
    ///
    /// Reports from connections that never logged in are ignored.
    pub async fn on_position_report(&self, session_id: &SessionId, report: &PositionReport) {
        let _fanout = self.fanout.lock().await;
        let update = match self
            .registry
            .update_and_evaluate(session_id, report, &self.evaluator)
        {
            Ok(update) => update,
            Err(e) if e.is_expected_state() => {
                debug!(session_id = %session_id, error = %e, "position report ignored");
                return;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "position report failed");
                return;
            }
        };

        self.hub.broadcast_snapshot(self.registry.snapshot()).await;
        for alert in update.alerts {
            self.hub.broadcast_alert(alert).await;
        }
    }

    /// Forget the publisher behind `session_id`, if any. Returns whether a
    /// vehicle was removed; a snapshot is broadcast only in that case.
    pub async fn on_publisher_disconnect(&self, session_id: &SessionId) -> bool {
        let _fanout = self.fanout.lock().await;
        if !self.registry.remove_session(session_id) {
            return false;
        }
        info!(session_id = %session_id, "publisher disconnected");
        self.hub.broadcast_snapshot(self.registry.snapshot()).await;
        true
    }

    /// Send the current snapshot to the requester only.
    pub async fn on_subscriber_snapshot_request(&self, session_id: &SessionId) {
        let _fanout = self.fanout.lock().await;
        if let Err(e) = self
            .hub
            .send_snapshot_to(session_id, self.registry.snapshot())
            .await
        {
            debug!(conn_id = %session_id, error = %e, "snapshot not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use bustrack_core::{Occupancy, Zone, ZoneCatalog, EARTH_RADIUS_KM};
    use serde_json::Value;
    use tokio::sync::mpsc;

    use super::*;
    use crate::ws::connection::SubscriberConnection;

    const DEPOT_LAT: f64 = 17.40;
    const DEPOT_LON: f64 = 78.47;

    fn north_of_depot(km: f64) -> f64 {
        DEPOT_LAT + (km / EARTH_RADIUS_KM).to_degrees()
    }

    fn make_tracker() -> Tracker {
        let catalog = ZoneCatalog::new(vec![Zone::new("Depot", DEPOT_LAT, DEPOT_LON, 0.3)]);
        Tracker::new(
            Arc::new(VehicleRegistry::new()),
            Arc::new(GeofenceEvaluator::with_default_hysteresis(Arc::new(catalog))),
            Arc::new(BroadcastHub::new()),
        )
    }

    async fn connect(tracker: &Tracker, id: &str) -> (SessionId, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(64);
        let id = SessionId::from(id);
        tracker
            .hub()
            .add(Arc::new(SubscriberConnection::new(id.clone(), tx)))
            .await;
        (id, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<Arc<String>>) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    fn kinds(frames: &[Value]) -> Vec<&str> {
        frames.iter().map(|f| f["type"].as_str().unwrap()).collect()
    }

    fn report(latitude: f64, longitude: f64) -> PositionReport {
        PositionReport::at(latitude, longitude)
    }

    #[tokio::test]
    async fn login_broadcasts_snapshot_to_everyone() {
        let tracker = make_tracker();
        let (pub_id, mut pub_rx) = connect(&tracker, "pub").await;
        let (_, mut sub_rx) = connect(&tracker, "sub").await;

        tracker.on_publisher_login(&pub_id, "BUS-1", "ROUTE_101").await;

        for rx in [&mut pub_rx, &mut sub_rx] {
            let frames = drain(rx);
            assert_eq!(kinds(&frames), ["snapshot"]);
            let vehicle = &frames[0]["vehicles"][0];
            assert_eq!(vehicle["vehicleId"], "BUS-1");
            assert_eq!(vehicle["latitude"], 0.0);
            assert_eq!(vehicle["longitude"], 0.0);
            assert_eq!(vehicle["occupancy"], "Low");
        }
    }

    #[tokio::test]
    async fn arrival_broadcasts_snapshot_then_single_alert() {
        let tracker = make_tracker();
        let (pub_id, _pub_rx) = connect(&tracker, "pub").await;
        let (_, mut sub_rx) = connect(&tracker, "sub").await;

        tracker.on_publisher_login(&pub_id, "BUS-1", "R").await;
        tracker
            .on_position_report(&pub_id, &report(north_of_depot(1.0), DEPOT_LON))
            .await;
        tracker
            .on_position_report(&pub_id, &report(north_of_depot(0.1), DEPOT_LON))
            .await;
        tracker
            .on_position_report(&pub_id, &report(north_of_depot(0.2), DEPOT_LON))
            .await;

        let frames = drain(&mut sub_rx);
        assert_eq!(
            kinds(&frames),
            ["snapshot", "snapshot", "snapshot", "alert", "snapshot"]
        );
        let alert = &frames[3];
        assert_eq!(alert["vehicleId"], "BUS-1");
        assert_eq!(alert["zoneName"], "Depot");
        assert_eq!(alert["message"], "Bus BUS-1 has arrived at Depot");
        assert_eq!(alert["eventType"], "arrival");
        assert_eq!(frames[2]["vehicles"][0]["currentZone"], "Depot");
    }

    #[tokio::test]
    async fn re_arrival_requires_leaving_the_band() {
        let tracker = make_tracker();
        let (pub_id, mut rx) = connect(&tracker, "pub").await;
        tracker.on_publisher_login(&pub_id, "BUS-1", "R").await;

        for km in [0.1, 0.45, 0.1, 0.6, 0.1] {
            tracker
                .on_position_report(&pub_id, &report(north_of_depot(km), DEPOT_LON))
                .await;
        }

        let alerts = drain(&mut rx).into_iter().filter(|f| f["type"] == "alert").count();
        assert_eq!(alerts, 2);
    }

    #[tokio::test]
    async fn report_updates_telemetry() {
        let tracker = make_tracker();
        let (pub_id, _rx) = connect(&tracker, "pub").await;
        tracker.on_publisher_login(&pub_id, "BUS-1", "R").await;

        let mut r = report(10.0, 20.0);
        r.speed_kmh = 42.0;
        r.occupancy = Some(Occupancy::High);
        tracker.on_position_report(&pub_id, &r).await;

        let session = tracker.registry().get(&pub_id).unwrap();
        assert!((session.speed - 42.0).abs() < f64::EPSILON);
        assert_eq!(session.occupancy, Occupancy::High);
    }

    #[tokio::test]
    async fn report_without_login_is_ignored() {
        let tracker = make_tracker();
        let (id, mut rx) = connect(&tracker, "anon").await;

        tracker.on_position_report(&id, &report(DEPOT_LAT, DEPOT_LON)).await;

        assert!(drain(&mut rx).is_empty());
        assert!(tracker.registry().is_empty());
    }

    #[tokio::test]
    async fn disconnect_broadcasts_only_when_vehicle_removed() {
        let tracker = make_tracker();
        let (a, _a_rx) = connect(&tracker, "a").await;
        let (b, _b_rx) = connect(&tracker, "b").await;
        let (_, mut sub_rx) = connect(&tracker, "sub").await;

        tracker.on_publisher_login(&a, "BUS-A", "R").await;
        tracker.on_publisher_login(&b, "BUS-B", "R").await;
        drain(&mut sub_rx);

        assert!(tracker.on_publisher_disconnect(&a).await);
        let frames = drain(&mut sub_rx);
        assert_eq!(kinds(&frames), ["snapshot"]);
        let vehicles = frames[0]["vehicles"].as_array().unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0]["vehicleId"], "BUS-B");

        assert!(!tracker.on_publisher_disconnect(&a).await);
        assert!(!tracker.on_publisher_disconnect(&SessionId::from("sub")).await);
        assert!(drain(&mut sub_rx).is_empty());
    }

    #[tokio::test]
    async fn snapshot_request_answers_requester_only() {
        let tracker = make_tracker();
        let (a, mut a_rx) = connect(&tracker, "a").await;
        let (b, mut b_rx) = connect(&tracker, "b").await;
        tracker.on_publisher_login(&a, "BUS-A", "R").await;
        drain(&mut a_rx);
        drain(&mut b_rx);

        tracker.on_subscriber_snapshot_request(&b).await;

        assert!(drain(&mut a_rx).is_empty());
        let frames = drain(&mut b_rx);
        assert_eq!(kinds(&frames), ["snapshot"]);
        assert_eq!(frames[0]["vehicles"][0]["vehicleId"], "BUS-A");
    }

    #[tokio::test]
    async fn empty_snapshot_request() {
        let tracker = make_tracker();
        let (id, mut rx) = connect(&tracker, "sub").await;

        tracker.handle_frame(&id, r#"{"type":"request_buses"}"#).await;

        let frames = drain(&mut rx);
        assert_eq!(frames[0]["vehicles"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn malformed_frame_gets_error_to_sender_only() {
        let tracker = make_tracker();
        let (a, mut a_rx) = connect(&tracker, "a").await;
        let (_, mut b_rx) = connect(&tracker, "b").await;

        tracker.handle_frame(&a, r#"{"type":"position","latitude":"x"}"#).await;

        let frames = drain(&mut a_rx);
        assert_eq!(kinds(&frames), ["error"]);
        assert_eq!(frames[0]["code"], "MALFORMED_INPUT");
        assert!(drain(&mut b_rx).is_empty());
        assert!(tracker.registry().is_empty());
    }

    #[tokio::test]
    async fn relogin_replaces_record_and_zone_state() {
        let tracker = make_tracker();
        let (id, mut rx) = connect(&tracker, "pub").await;

        tracker
            .handle_frame(&id, r#"{"type":"driver_login","busId":"BUS-1","routeId":"R"}"#)
            .await;
        tracker
            .on_position_report(&id, &report(DEPOT_LAT, DEPOT_LON))
            .await;
        tracker.on_publisher_login(&id, "BUS-2", "R2").await;

        let session = tracker.registry().get(&id).unwrap();
        assert_eq!(session.vehicle_id, "BUS-2");
        assert!(session.current_zone_name.is_none());
        assert_eq!(tracker.registry().len(), 1);

        // Back inside the depot triggers a fresh arrival for the new record.
        tracker
            .on_position_report(&id, &report(DEPOT_LAT, DEPOT_LON))
            .await;
        let alerts: Vec<_> = drain(&mut rx).into_iter().filter(|f| f["type"] == "alert").collect();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1]["vehicleId"], "BUS-2");
    }

    fn session_ids(snapshot: &Value) -> Vec<String> {
        let mut ids: Vec<String> = snapshot["vehicles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_snapshot_matches_registry_under_concurrent_events() {
        for round in 0..50 {
            let tracker = make_tracker();
            let (viewer_tx, mut viewer_rx) = mpsc::channel(1024);
            tracker
                .hub()
                .add(Arc::new(SubscriberConnection::new(SessionId::from("viewer"), viewer_tx)))
                .await;

            let publishers: Vec<SessionId> =
                (0..16).map(|i| SessionId::from(format!("bus-{i}"))).collect();
            for id in &publishers {
                tracker.on_publisher_login(id, id.as_str(), "R").await;
            }

            let mut tasks = Vec::new();
            for (i, id) in publishers.iter().cloned().enumerate() {
                let tracker = tracker.clone();
                tasks.push(tokio::spawn(async move {
                    if i % 2 == 0 {
                        tracker.on_publisher_disconnect(&id).await;
                    } else {
                        for step in 0..4 {
                            let lat = 10.0 + f64::from(step) * 0.01;
                            tracker.on_position_report(&id, &report(lat, 20.0)).await;
                        }
                    }
                }));
            }
            for task in tasks {
                task.await.unwrap();
            }

            let last = drain(&mut viewer_rx)
                .into_iter()
                .rfind(|f| f["type"] == "snapshot")
                .unwrap();
            let mut expected: Vec<String> = tracker
                .registry()
                .snapshot()
                .into_iter()
                .map(|v| v.session_id.as_str().to_string())
                .collect();
            expected.sort();

            assert_eq!(expected.len(), 8);
            assert_eq!(session_ids(&last), expected, "round {round}");
            let positions: Vec<f64> = last["vehicles"]
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v["latitude"].as_f64().unwrap())
                .collect();
            assert!(positions.iter().all(|lat| (lat - 10.03).abs() < 1e-9), "round {round}");
        }
    }
}

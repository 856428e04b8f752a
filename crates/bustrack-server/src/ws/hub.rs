//! Fan-out of snapshots and alerts to connected clients.

use std::collections::HashMap;
use std::sync::Arc;

use bustrack_core::{AlertEvent, ServerMessage, SessionId, TrackerError, VehicleSession};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::SubscriberConnection;

/// Set of connected clients and the broadcast operations over them.
///
/// Every connected client is a subscriber, including publishers. Frames are
/// serialized once and shared between recipients.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    connections: RwLock<HashMap<SessionId, Arc<SubscriberConnection>>>,
}

impl BroadcastHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. A connection with the same id is replaced.
    pub async fn add(&self, connection: Arc<SubscriberConnection>) {
        let mut conns = self.connections.write().await;
        let _ = conns.insert(connection.id.clone(), connection);
    }

    /// Remove a connection by id. Returns whether it was present.
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.connections.write().await.remove(id).is_some()
    }

    /// Number of connected clients.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send the full vehicle list to every client.
    pub async fn broadcast_snapshot(&self, vehicles: Vec<VehicleSession>) -> usize {
        self.broadcast(&ServerMessage::Snapshot { vehicles }).await
    }

    /// Send one alert to every client.
    pub async fn broadcast_alert(&self, alert: AlertEvent) -> usize {
        self.broadcast(&ServerMessage::Alert(alert)).await
    }

    /// Send the full vehicle list to a single client.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::SubscriberUnreachable`] if the client is gone
    /// or its queue is full.
    pub async fn send_snapshot_to(
        &self,
        id: &SessionId,
        vehicles: Vec<VehicleSession>,
    ) -> Result<(), TrackerError> {
        self.send_to(id, &ServerMessage::Snapshot { vehicles }).await
    }

    /// Send a frame to a single client.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::SubscriberUnreachable`] if the client is gone
    /// or its queue is full, or [`TrackerError::Serialization`] if the frame
    /// cannot be encoded.
    pub async fn send_to(&self, id: &SessionId, message: &ServerMessage) -> Result<(), TrackerError> {
        let frame = Arc::new(message.to_json()?);
        let conns = self.connections.read().await;
        let conn = conns
            .get(id)
            .ok_or_else(|| TrackerError::SubscriberUnreachable(id.clone()))?;
        conn.send(frame)
    }

    /// Queue a frame on every connection. Returns how many accepted it.
    ///
    /// Connections whose queue is full or closed miss this frame; nobody
    /// waits on them.
    pub async fn broadcast(&self, message: &ServerMessage) -> usize {
        let frame = match message.to_json() {
            Ok(json) => Arc::new(json),
            Err(e) => {
                warn!(kind = message.kind(), error = %e, "failed to serialize frame");
                return 0;
            }
        };

        let conns = self.connections.read().await;
        let mut delivered = 0;
        for conn in conns.values() {
            match conn.send(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(_) if conn.is_closed() => {
                    debug!(conn_id = %conn.id, kind = message.kind(), "connection closing, frame dropped");
                }
                Err(_) => {
                    warn!(
                        conn_id = %conn.id,
                        kind = message.kind(),
                        dropped = conn.drop_count(),
                        "outbound queue full, frame dropped"
                    );
                }
            }
        }
        debug!(kind = message.kind(), recipients = conns.len(), delivered, "broadcast");
        delivered
    }
}

//! Lifecycle of one WebSocket client from upgrade to disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use bustrack_core::SessionId;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use super::connection::SubscriberConnection;
use crate::state::AppState;

/// Interval between server-initiated Ping frames.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Run a session for a freshly upgraded socket.
///
/// The connection joins the hub immediately, so it receives broadcasts
/// whether or not it ever logs in. On disconnect it leaves the hub before
/// its vehicle (if any) is removed, so the farewell snapshot is not queued
/// to the socket that is going away.
#[instrument(skip_all, fields(conn_id = %conn_id))]
pub async fn run_session(ws: WebSocket, conn_id: SessionId, state: AppState) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let depth = state.config().server.subscriber_queue_depth.max(1);
    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(depth);
    let connection = Arc::new(SubscriberConnection::new(conn_id.clone(), send_tx));

    state.hub().add(Arc::clone(&connection)).await;
    info!("client connected");

    let outbound = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(PING_INTERVAL);
        let _ = ping_interval.tick().await;

        loop {
            tokio::select! {
                frame = send_rx.recv() => {
                    let Some(text) = frame else { break };
                    if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                        break;
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = ws_tx.close().await;
    });

    let tracker = state.tracker();
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => tracker.handle_frame(&conn_id, text.as_str()).await,
            Message::Binary(data) => match std::str::from_utf8(&data) {
                Ok(text) => tracker.handle_frame(&conn_id, text).await,
                Err(_) => debug!(len = data.len(), "ignoring non-UTF8 binary frame"),
            },
            Message::Close(_) => {
                debug!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    let _ = state.hub().remove(&conn_id).await;
    let was_publisher = tracker.on_publisher_disconnect(&conn_id).await;
    outbound.abort();

    info!(
        was_publisher,
        dropped_frames = connection.drop_count(),
        duration_secs = connection.age().as_secs_f64(),
        "client disconnected"
    );
}

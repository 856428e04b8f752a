//! WebSocket endpoint shared by drivers and viewers.

pub mod connection;
pub mod hub;
pub mod session;

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use bustrack_core::SessionId;

use crate::state::AppState;

/// Upgrade an HTTP request to a WebSocket session.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let conn_id = SessionId::generate();
    ws.on_upgrade(move |socket| session::run_session(socket, conn_id, state))
}

//! `WebSocket` feed for triggered SOS alerts.
//!
//! Clients connect to `GET /ws/alerts` and receive the JSON-encoded
//! [`crate::model::SosAlert`] frame for every `sos-triggered` event
//! published after they connected. Frames are pre-encoded by the
//! broadcaster, so this handler only forwards them.
//!
//! If a client falls behind, lagged frames are skipped and the client
//! resumes from the most recent alert; there is no replay.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::debug;

use crate::api::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming SOS alerts.
///
/// # Route
///
/// `GET /ws/alerts`
pub async fn ws_alerts(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward broadcast frames to the socket until either side goes away.
async fn handle_ws(mut socket: WebSocket, state: AppState) {
    debug!("SOS feed client connected");

    let mut rx = state.sos.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        if socket.send(Message::Text(frame)).await.is_err() {
                            debug!("SOS feed client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "SOS feed client lagged, skipping ahead");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("SOS channel closed, shutting down feed");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("SOS feed client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("SOS feed client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("SOS feed socket error: {e}");
                        return;
                    }
                    _ => {
                        // Clients have nothing useful to send us; ignore.
                    }
                }
            }
        }
    }
}

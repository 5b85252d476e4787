//! WebSocket upgrade handler
//!
//! Binds each accepted socket to exactly one new relay session and keeps the
//! session map accurate across every teardown path.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};

use tg_protocol::{encode_server_frame, ServerFrame};

use crate::server::listener::AppState;
use crate::session::{RelaySession, SessionHandle};

/// Accept a relay upgrade request
pub(crate) async fn upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    let (mut sink, stream) = socket.split();

    // Admission: the session map is authoritative for the cap.
    if let Some(max) = app.gateway.config.max_sessions {
        if app.gateway.sessions.len() >= max as usize {
            tracing::warn!("Session limit ({}) reached, rejecting connection", max);
            if let Ok(text) = encode_server_frame(&ServerFrame::Error {
                message: "Session limit reached".to_string(),
            }) {
                let _ = sink.send(Message::Text(text)).await;
            }
            let _ = sink.close().await;
            return;
        }
    }

    let handle = Arc::new(SessionHandle::new());
    tracing::info!(session = %handle.id, "Channel accepted");
    app.gateway.sessions.insert(Arc::clone(&handle));

    // The session removes its own map entry on every exit path.
    RelaySession::new(handle, Arc::clone(&app.gateway), app.cancel.clone())
        .run(sink, stream)
        .await;
}

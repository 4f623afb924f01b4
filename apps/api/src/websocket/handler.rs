//! WebSocket upgrade handler
//!
//! Authorization has already happened in the router's gate by the time a
//! request reaches this handler. The channel is receive-only for clients:
//! inbound text is ignored and a close frame or transport error ends it.

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, Extension, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use crate::server::ListenerShutdown;
use crate::state::AppState;

use super::connection::{ConnectionHandle, ConnectionId};
use super::hub::BroadcastHub;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(shutdown): Extension<ListenerShutdown>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let hub = state.hub.clone();

    ws.on_upgrade(move |socket| handle_socket(socket, peer, hub, shutdown))
}

/// Handle an established WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    peer: Option<SocketAddr>,
    hub: BroadcastHub,
    shutdown: ListenerShutdown,
) {
    let connection_id = ConnectionId::new();
    let (handle, mut rx) = ConnectionHandle::channel(peer);
    let (mut ws_sender, mut ws_receiver) = socket.split();

    if !hub.on_connect(connection_id, handle).await {
        let _ = ws_sender.close().await;
        return;
    }

    tracing::info!(
        connection_id = %connection_id,
        peer = ?peer,
        "WebSocket connection opened"
    );

    // Forward queued messages until the queue closes or the listener stops
    let token = shutdown.token();
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    let frame = CloseFrame {
                        code: close_code::AWAY,
                        reason: "listener stopping".into(),
                    };
                    let _ = ws_sender.send(Message::Close(Some(frame))).await;
                    break;
                }
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if ws_sender.send(Message::Text(json)).await.is_err() {
                                tracing::debug!(connection_id = %connection_id, "WebSocket send failed");
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize message");
                        }
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    tracing::trace!(connection_id = %connection_id, len = text.len(), "Ignoring client text frame");
                }
                Ok(Message::Binary(_)) => {
                    tracing::trace!(connection_id = %connection_id, "Ignoring client binary frame");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Pings are answered by the transport
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "WebSocket close received");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, connection_id = %connection_id, "WebSocket error");
                    break;
                }
            }
        }
    });

    // Wait for either task to complete, then abort the other
    tokio::select! {
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task completed");
            send_task.abort();
        }
    }

    hub.on_disconnect(connection_id).await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection closed");
}

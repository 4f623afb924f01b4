//! Broadcast Hub
//!
//! Tracks live real-time connections and fans player events out to them.
//! Registering a connection (with its snapshot), applying an event to the
//! State Mirror and broadcasting its delta all happen under the same lock, so
//! each connection sees exactly one snapshot followed by a suffix of the
//! global event order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::models::PlayerEvent;
use crate::services::{EventReceiver, StateMirror};

use super::connection::{ConnectionHandle, ConnectionId};
use super::messages::ServerMessage;

/// Fan-out point for player state changes
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    connections: Arc<Mutex<HashMap<ConnectionId, ConnectionHandle>>>,
    mirror: StateMirror,
}

impl BroadcastHub {
    /// Create a hub publishing the given mirror's state
    pub fn new(mirror: StateMirror) -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
            mirror,
        }
    }

    /// The mirror this hub writes to
    pub fn mirror(&self) -> &StateMirror {
        &self.mirror
    }

    /// Register a connection and queue its snapshot
    ///
    /// Returns `false` when the id is already registered (nothing is sent
    /// twice) or the connection's writer is already gone.
    pub async fn on_connect(&self, id: ConnectionId, handle: ConnectionHandle) -> bool {
        let mut connections = self.connections.lock().await;
        if connections.contains_key(&id) {
            tracing::debug!(connection_id = %id, "Connection already registered");
            return false;
        }

        let snapshot = self.mirror.with_state(ServerMessage::snapshot);
        if handle.send(snapshot).is_err() {
            tracing::debug!(connection_id = %id, "Connection closed before snapshot");
            return false;
        }

        connections.insert(id, handle);
        tracing::debug!(
            connection_id = %id,
            total = connections.len(),
            "Connection registered"
        );
        true
    }

    /// Remove a connection; removing an unknown id is a no-op
    pub async fn on_disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        let Some(handle) = connections.remove(&id) else {
            return false;
        };
        tracing::debug!(
            connection_id = %id,
            connected_secs = handle.connected_for().num_seconds(),
            total = connections.len(),
            "Connection removed"
        );
        true
    }

    /// Apply an event to the mirror and broadcast its delta
    ///
    /// Returns the number of connections the delta was queued for. Dead
    /// connections are reaped without affecting delivery to the rest.
    pub async fn on_event(&self, event: PlayerEvent) -> usize {
        let mut connections = self.connections.lock().await;

        let state = self.mirror.apply(&event);
        let msg = ServerMessage::delta(&event, &state);

        let mut sent = 0;
        let mut dead = Vec::new();
        for (id, handle) in connections.iter() {
            if handle.send(msg.clone()).is_ok() {
                sent += 1;
            } else {
                dead.push(*id);
            }
        }

        for id in dead {
            tracing::debug!(connection_id = %id, "Reaping closed connection");
            connections.remove(&id);
        }

        tracing::trace!(
            event = event.kind(),
            message = msg.message_type(),
            recipients = sent,
            "Broadcast player event"
        );
        sent
    }

    /// Number of registered connections
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Consume player events until the channel closes
    pub async fn run(self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            self.on_event(event).await;
        }
        tracing::info!("Player event channel closed");
    }

    /// Spawn the event loop on the runtime
    pub fn spawn(&self, events: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(events))
    }
}

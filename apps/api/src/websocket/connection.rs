//! Real-time connection handles

use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::ServerMessage;

/// Opaque identifier of one real-time connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Receiving end of a connection's outbound queue, drained by its writer task
pub type MessageReceiver = mpsc::UnboundedReceiver<ServerMessage>;

/// Handle for queueing messages to a specific connection
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Outbound queue for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,

    /// Remote address, when known
    pub peer: Option<SocketAddr>,

    connected_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver its writer task drains
    pub fn channel(peer: Option<SocketAddr>) -> (Self, MessageReceiver) {
        let (sender, rx) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                peer,
                connected_at: Utc::now(),
            },
            rx,
        )
    }

    /// Queue a message for this connection
    #[allow(clippy::result_large_err)]
    pub fn send(&self, msg: ServerMessage) -> Result<(), mpsc::error::SendError<ServerMessage>> {
        self.sender.send(msg)
    }

    /// Time since the connection was established
    pub fn connected_for(&self) -> Duration {
        Utc::now() - self.connected_at
    }
}

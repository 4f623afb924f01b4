//! Real-time channel
//!
//! Clients connect to `/api/v1/ws` and receive a full player snapshot
//! followed by one typed delta per player event.

pub mod connection;
pub mod handler;
pub mod hub;
pub mod messages;

pub use connection::{ConnectionHandle, ConnectionId};
pub use handler::ws_handler;
pub use hub::BroadcastHub;
pub use messages::{PlayerSnapshot, ServerMessage};

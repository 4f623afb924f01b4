//! Player remote gateway library
//!
//! Exposes a media player's state to remote clients over HTTP and WebSocket
//! and relays their control commands back to the player. The pieces are
//! exported for the binary and for integration tests.

pub mod bridge;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod websocket;

// Re-export commonly used types
pub use config::{AuthSettings, AuthStrategy, Config, ConfigHandle};
pub use error::{ApiError, ApiResult, ErrorResponse, ListenerError};
pub use server::{build_router, ApplyOutcome, ListenerStatus, ServerLifecycle};
pub use state::AppState;

/// Lifecycle manager serving the full application router for `state`
pub fn lifecycle_for(state: AppState) -> ServerLifecycle {
    let config = state.config.clone();
    ServerLifecycle::new(config, move |shutdown| build_router(state.clone(), shutdown))
}

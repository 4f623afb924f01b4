//! Network listener and router
//!
//! - `router`: builds the application router for one listener generation
//! - `lifecycle`: starts, restarts and stops the listener

pub mod lifecycle;
pub mod router;

pub use lifecycle::{ApplyOutcome, ListenerStatus, RouterFactory, ServerLifecycle, DRAIN_TIMEOUT};
pub use router::{build_cors_layer, build_router, ListenerShutdown};

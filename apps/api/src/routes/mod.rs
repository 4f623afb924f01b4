//! HTTP route handlers
//!
//! - Control API (`/api/v1/...`)
//! - Credential endpoint (`/auth/:id`)
//! - Route listing (`/doc`)
//! - Health checks (`/health`)

pub mod auth;
pub mod control;
pub mod docs;
pub mod health;

pub use auth::auth_router;
pub use control::control_router;
pub use docs::docs_router;
pub use health::health_router;

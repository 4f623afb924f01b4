//! Middleware components
//!
//! - `authenticate` / `authorize`: the Auth Gate in front of `/api/`
//! - `private_network_access`: Private Network Access opt-in header

pub mod auth;
pub mod private_network;

pub use auth::{authenticate, authorize, is_authorized, Authentication, CredentialFailure};
pub use private_network::private_network_access;

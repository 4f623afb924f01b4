//! Core services
//!
//! - Credential minting and verification
//! - The State Mirror holding the latest player state
//! - The player command and event channels

pub mod auth;
pub mod mirror;
pub mod player;

pub use auth::TokenService;
pub use mirror::StateMirror;
pub use player::{
    event_channel, CommandReceiver, EventReceiver, EventSender, PlayerCommand, PlayerHandle,
    PlayerRequest,
};

//! Domain models
//!
//! Plain data types shared by the services, the real-time channel and the
//! Control API handlers.

pub mod auth;
pub mod player;

pub use auth::Claims;
pub use player::{LikeStatus, PlayerEvent, PlayerState, RepeatMode, SongInfo, VolumeState};

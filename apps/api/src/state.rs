//! Shared application state

use crate::config::{Config, ConfigHandle};
use crate::services::{PlayerHandle, StateMirror};
use crate::websocket::BroadcastHub;

/// State shared by every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live configuration, swapped by the lifecycle manager
    pub config: ConfigHandle,

    /// Latest known player state
    pub mirror: StateMirror,

    /// Real-time connection registry
    pub hub: BroadcastHub,

    /// Command channel to the player
    pub player: PlayerHandle,
}

impl AppState {
    /// Wire up state around a player handle
    pub fn new(config: ConfigHandle, player: PlayerHandle) -> Self {
        let mirror = StateMirror::new();
        Self {
            config,
            hub: BroadcastHub::new(mirror.clone()),
            mirror,
            player,
        }
    }

    /// Snapshot of the current configuration
    pub fn current_config(&self) -> std::sync::Arc<Config> {
        self.config.current()
    }
}

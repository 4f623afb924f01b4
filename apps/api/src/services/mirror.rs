//! State Mirror
//!
//! Holds the single authoritative copy of the player state. Writes come only
//! from player events (through the broadcast hub); everything else reads.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{PlayerEvent, PlayerState};

/// Process-wide cache of the latest known player state
#[derive(Debug, Clone)]
pub struct StateMirror {
    tx: Arc<watch::Sender<PlayerState>>,
}

impl StateMirror {
    /// Create a mirror holding the default state
    pub fn new() -> Self {
        Self::with_initial(PlayerState::default())
    }

    /// Create a mirror holding a known state
    pub fn with_initial(state: PlayerState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Apply an event and return the resulting state
    ///
    /// Readers never observe a partially applied event.
    pub(crate) fn apply(&self, event: &PlayerEvent) -> PlayerState {
        self.tx.send_modify(|state| state.apply(event));
        self.tx.borrow().clone()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> PlayerState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it
    pub fn with_state<R>(&self, f: impl FnOnce(&PlayerState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.tx.subscribe()
    }
}

impl Default for StateMirror {
    fn default() -> Self {
        Self::new()
    }
}

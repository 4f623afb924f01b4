//! Test fixtures: a fully wired gateway without a real player

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use pear_remote_api::models::SongInfo;
use pear_remote_api::server::ListenerShutdown;
use pear_remote_api::services::{
    event_channel, CommandReceiver, EventSender, PlayerHandle, TokenService,
};
use pear_remote_api::{
    build_router, lifecycle_for, AppState, AuthSettings, Config, ConfigHandle, ServerLifecycle,
};
use pear_remote_shared_config::ListenerConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Secret used by token-strategy fixtures
pub const SECRET: &str = "s";

/// Gateway with in-memory player channels
pub struct TestGateway {
    pub state: AppState,
    pub lifecycle: ServerLifecycle,
    /// Push player events here
    pub events: EventSender,
    /// Commands sent to the player arrive here
    pub commands: CommandReceiver,
    hub_task: JoinHandle<()>,
}

impl TestGateway {
    /// Gateway listening on an ephemeral loopback port once started
    pub fn new(auth: AuthSettings) -> Self {
        Self::with_listener(ListenerConfig::plain("127.0.0.1", 0), auth)
    }

    pub fn with_listener(listener: ListenerConfig, auth: AuthSettings) -> Self {
        let config = ConfigHandle::new(Config::new(listener, auth));
        let (player, commands) = PlayerHandle::channel();
        let (events, events_rx) = event_channel();

        let state = AppState::new(config, player);
        let hub_task = state.hub.spawn(events_rx);
        let lifecycle = lifecycle_for(state.clone());

        Self {
            state,
            lifecycle,
            events,
            commands,
            hub_task,
        }
    }

    /// Router for in-process `oneshot` requests
    pub fn router(&self) -> Router {
        build_router(
            self.state.clone(),
            ListenerShutdown::new(CancellationToken::new()),
        )
    }

    /// Current configuration, owned
    pub fn config(&self) -> Config {
        Config::clone(&self.state.config.current())
    }

    /// Start the listener with the current configuration
    pub async fn start(&self) -> SocketAddr {
        self.lifecycle
            .apply(self.config())
            .await
            .expect("listener should start");
        self.lifecycle
            .local_addr()
            .await
            .expect("running listener has an address")
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.hub_task.abort();
    }
}

/// Credential for a client, signed with [`SECRET`]
pub fn token_for(client_id: &str) -> String {
    TokenService::new(SECRET)
        .issue(client_id)
        .expect("token should be issued")
}

/// Token settings authorizing the given clients
pub fn token_auth(clients: &[&str]) -> AuthSettings {
    AuthSettings::token(SECRET, clients.iter().copied())
}

/// A song fixture
pub fn song(id: &str, duration_seconds: u64) -> SongInfo {
    SongInfo {
        id: id.to_string(),
        title: format!("Title {}", id),
        artist: "Artist".to_string(),
        artwork_url: None,
        duration_seconds,
        is_paused: false,
        is_live: false,
        elapsed_seconds: 0,
    }
}

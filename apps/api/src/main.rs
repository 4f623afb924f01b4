use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pear_remote_api::bridge::PlayerBridge;
use pear_remote_api::services::{event_channel, PlayerHandle};
use pear_remote_api::{lifecycle_for, AppState, Config, ConfigHandle, ServerLifecycle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout carries the player bridge
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
                .unwrap_or_else(|_| "pear_remote_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        listener = %config.listener(),
        auth = %config.auth.strategy,
        environment = %config.environment(),
        "Starting player remote gateway"
    );

    let config_handle = ConfigHandle::new(config.clone());
    let (player, commands) = PlayerHandle::channel();
    let (events_tx, events_rx) = event_channel();

    let state = AppState::new(config_handle, player);
    let hub_task = state.hub.spawn(events_rx);

    let mut bridge_task = tokio::spawn(
        PlayerBridge::new(events_tx, commands)
            .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()),
    );

    let lifecycle = lifecycle_for(state);

    // A failed start leaves the gateway stopped until the next reload
    if let Err(e) = lifecycle.apply(config).await {
        tracing::error!(error = %e, "Listener not started; fix the configuration and send SIGHUP");
    }

    loop {
        tokio::select! {
            _ = shutdown_signal() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = reload_signal() => {
                reload(&lifecycle).await;
            }
            result = &mut bridge_task => {
                match result {
                    Ok(Ok(())) => tracing::info!("Player disconnected"),
                    Ok(Err(e)) => tracing::error!(error = %e, "Player bridge failed"),
                    Err(e) => tracing::error!(error = %e, "Player bridge task panicked"),
                }
                break;
            }
        }
    }

    lifecycle.stop().await;
    bridge_task.abort();
    hub_task.abort();

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Re-read `.env` and the environment, then apply the result
async fn reload(lifecycle: &ServerLifecycle) {
    dotenvy::dotenv_override().ok();

    match Config::from_env() {
        Ok(config) => match lifecycle.apply(config).await {
            Ok(outcome) => tracing::info!(outcome = ?outcome, "Configuration reloaded"),
            Err(e) => tracing::error!(error = %e, "Listener failed after reload"),
        },
        Err(e) => tracing::error!(error = %e, "Invalid configuration, keeping the current one"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(unix)]
async fn reload_signal() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
        Ok(mut signal) => {
            signal.recv().await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for SIGHUP");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn reload_signal() {
    std::future::pending::<()>().await;
}

//! Router assembly
//!
//! A fresh router is built for every listener generation so that the
//! generation's shutdown token reaches the real-time handlers.

use axum::{
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Extension, Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{authenticate, authorize, private_network_access};
use crate::routes::{auth_router, control_router, docs_router, health_router};
use crate::state::AppState;
use crate::websocket::ws_handler;

/// Cancelled when the listener that accepted a connection stops
#[derive(Debug, Clone)]
pub struct ListenerShutdown(CancellationToken);

impl ListenerShutdown {
    pub fn new(token: CancellationToken) -> Self {
        Self(token)
    }

    /// Token to await or poll
    pub fn token(&self) -> CancellationToken {
        self.0.clone()
    }
}

/// Build the full application router
pub fn build_router(state: AppState, shutdown: ListenerShutdown) -> Router {
    let config = state.current_config();

    // Privileged routes: the gate authenticates first, then authorizes
    let api = Router::new()
        .route("/ws", get(ws_handler))
        .merge(control_router())
        .route_layer(from_fn_with_state(state.clone(), authorize))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .nest("/api/v1", api)
        // Credential endpoint: /auth/:id
        .nest("/auth", auth_router())
        .nest("/doc", docs_router())
        // Nested health routes: /health, /health/live, /health/ready
        .nest("/health", health_router())
        .layer(Extension(shutdown))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config))
        .layer(from_fn(private_network_access))
        .with_state(state)
}

/// Build the CORS layer from configuration
pub fn build_cors_layer(config: &Config) -> CorsLayer {
    let is_production = config.is_production();

    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            // Parse configured origins
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                tracing::info!(
                    "CORS configured with {} allowed origin(s): {:?}",
                    allowed_origins.len(),
                    origins
                );
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PATCH,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([
                        header::AUTHORIZATION,
                        header::CONTENT_TYPE,
                        header::ACCEPT,
                        header::ORIGIN,
                    ])
                    .allow_private_network(true)
                    .max_age(std::time::Duration::from_secs(3600))
            }
        }
        _ if is_production => {
            // Production without configured origins: strict CORS (no origins allowed)
            tracing::warn!(
                "CORS_ORIGINS not configured in production mode. \
                 CORS requests will be rejected. Set CORS_ORIGINS to allow cross-origin requests."
            );
            CorsLayer::new()
        }
        _ => {
            // Remote controls usually live on another LAN origin
            tracing::debug!("Using permissive CORS; set CORS_ORIGINS to restrict origins");
            CorsLayer::permissive()
        }
    }
}

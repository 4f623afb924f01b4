//! Route listing served at `GET /doc`

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// One documented route
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RouteDoc {
    pub method: &'static str,
    pub path: &'static str,
    /// Whether the Auth Gate guards this route
    pub protected: bool,
    pub summary: &'static str,
}

const fn route(
    method: &'static str,
    path: &'static str,
    protected: bool,
    summary: &'static str,
) -> RouteDoc {
    RouteDoc {
        method,
        path,
        protected,
        summary,
    }
}

/// Every route the gateway serves
pub const ROUTES: &[RouteDoc] = &[
    route("GET", "/health", false, "Liveness check"),
    route("GET", "/health/live", false, "Liveness probe with version"),
    route("GET", "/health/ready", false, "Readiness (player attached)"),
    route("GET", "/doc", false, "This route listing"),
    route("POST", "/auth/:id", false, "Request a credential for a client id"),
    route("GET", "/api/v1/ws", true, "Real-time player state channel"),
    route("GET", "/api/v1/song", true, "Current song (204 when none)"),
    route("GET", "/api/v1/volume", true, "Volume and mute state"),
    route("POST", "/api/v1/volume", true, "Set volume {volume}"),
    route("GET", "/api/v1/like-state", true, "Like status of the current song"),
    route("GET", "/api/v1/repeat-mode", true, "Repeat mode"),
    route("GET", "/api/v1/shuffle", true, "Shuffle state"),
    route("POST", "/api/v1/shuffle", true, "Shuffle the queue"),
    route("POST", "/api/v1/play", true, "Resume playback"),
    route("POST", "/api/v1/pause", true, "Pause playback"),
    route("POST", "/api/v1/toggle-play", true, "Toggle play/pause"),
    route("POST", "/api/v1/previous", true, "Previous track"),
    route("POST", "/api/v1/next", true, "Next track"),
    route("POST", "/api/v1/seek-to", true, "Seek to {seconds}"),
    route("POST", "/api/v1/go-back", true, "Seek back by {seconds}"),
    route("POST", "/api/v1/go-forward", true, "Seek forward by {seconds}"),
    route("POST", "/api/v1/toggle-mute", true, "Toggle mute"),
    route("POST", "/api/v1/like", true, "Toggle like"),
    route("POST", "/api/v1/dislike", true, "Toggle dislike"),
    route("POST", "/api/v1/switch-repeat", true, "Cycle repeat mode {iteration}"),
    route("POST", "/api/v1/play-now", true, "Play {videoId} immediately"),
    route("GET", "/api/v1/queue", true, "Current queue"),
    route("POST", "/api/v1/queue", true, "Add {videoId, insertPosition}"),
    route("PATCH", "/api/v1/queue", true, "Jump to queue {index}"),
    route("DELETE", "/api/v1/queue", true, "Clear the queue"),
    route("PATCH", "/api/v1/queue/:index", true, "Move item to {toIndex}"),
    route("DELETE", "/api/v1/queue/:index", true, "Remove item"),
    route("POST", "/api/v1/search", true, "Search {query, params?, continuation?}"),
    route("GET", "/api/v1/playlists", true, "Library playlists"),
    route("POST", "/api/v1/playlists/:id/play", true, "Play a playlist"),
];

/// Create the documentation router
pub fn docs_router() -> Router<AppState> {
    Router::new().route("/", get(list_routes))
}

async fn list_routes() -> Json<&'static [RouteDoc]> {
    Json(ROUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_routes_are_protected() {
        for doc in ROUTES {
            assert_eq!(doc.protected, doc.path.starts_with("/api/"), "{}", doc.path);
        }
    }

    #[test]
    fn test_listing_is_unique() {
        let mut seen = std::collections::HashSet::new();
        for doc in ROUTES {
            assert!(seen.insert((doc.method, doc.path)), "{} {}", doc.method, doc.path);
        }
    }
}

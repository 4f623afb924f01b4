//! Player process interface
//!
//! The media player is an external collaborator. It pushes [`PlayerEvent`]s
//! into an event channel and receives [`PlayerCommand`]s from a command
//! channel. Commands that produce data carry a oneshot reply channel.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::{ApiError, ApiResult};
use crate::models::PlayerEvent;

/// How long a command waits for the player's reply
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a client approval prompt may stay open
pub const APPROVAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a video is inserted into the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertPosition {
    InsertAfterCurrentVideo,
    #[default]
    InsertAtEnd,
}

/// A named command sent to the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum PlayerCommand {
    Play,
    Pause,
    TogglePlay,
    Previous,
    Next,
    SeekTo { seconds: f64 },
    GoBack { seconds: f64 },
    GoForward { seconds: f64 },
    SetVolume { volume: u8 },
    ToggleMute,
    ToggleLike,
    ToggleDislike,
    SwitchRepeat { iteration: u32 },
    Shuffle,
    #[serde(rename_all = "camelCase")]
    PlayNow { video_id: String },
    GetQueue,
    #[serde(rename_all = "camelCase")]
    AddToQueue {
        video_id: String,
        insert_position: InsertPosition,
    },
    #[serde(rename_all = "camelCase")]
    MoveInQueue { from_index: usize, to_index: usize },
    RemoveFromQueue { index: usize },
    SetQueueIndex { index: usize },
    ClearQueue,
    Search {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        continuation: Option<String>,
    },
    GetPlaylists,
    #[serde(rename_all = "camelCase")]
    PlayPlaylist { playlist_id: String },
    /// Ask the user whether a new client may control the player
    #[serde(rename_all = "camelCase")]
    AuthorizeClient { client_id: String },
}

impl PlayerCommand {
    /// Short name for logging
    pub fn name(&self) -> String {
        serde_json::to_value(self)
            .ok()
            .and_then(|v| v.get("name").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Player's answer to a command
pub type CommandReply = Result<Value, String>;

/// A command in flight, with an optional reply channel
#[derive(Debug)]
pub struct PlayerRequest {
    pub command: PlayerCommand,
    pub reply: Option<oneshot::Sender<CommandReply>>,
}

impl PlayerRequest {
    /// Answer the request; a missing or dropped reply channel is ignored
    pub fn respond(self, reply: CommandReply) {
        if let Some(tx) = self.reply {
            let _ = tx.send(reply);
        }
    }
}

/// Receiving end of the command channel, held by the player bridge
pub type CommandReceiver = mpsc::UnboundedReceiver<PlayerRequest>;

/// Sending half of the command channel
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<PlayerRequest>,
    reply_timeout: Duration,
}

impl PlayerHandle {
    /// Create a connected handle and command receiver
    pub fn channel() -> (Self, CommandReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                reply_timeout: DEFAULT_REPLY_TIMEOUT,
            },
            rx,
        )
    }

    /// Override the reply timeout
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Whether the player end is still attached
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Fire a command without waiting for the player
    pub fn send(&self, command: PlayerCommand) -> ApiResult<()> {
        tracing::debug!(command = %command.name(), "Sending player command");
        self.tx
            .send(PlayerRequest {
                command,
                reply: None,
            })
            .map_err(|_| ApiError::PlayerUnavailable)
    }

    /// Send a command and wait for the player's reply
    pub async fn request(&self, command: PlayerCommand) -> ApiResult<Value> {
        self.request_with_timeout(command, self.reply_timeout).await
    }

    /// Send a command and wait up to `timeout` for the player's reply
    pub async fn request_with_timeout(
        &self,
        command: PlayerCommand,
        timeout: Duration,
    ) -> ApiResult<Value> {
        let name = command.name();
        tracing::debug!(command = %name, "Requesting from player");

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PlayerRequest {
                command,
                reply: Some(reply_tx),
            })
            .map_err(|_| ApiError::PlayerUnavailable)?;

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(ApiError::PlayerCommandFailed(message)),
            // Player dropped the request without answering
            Ok(Err(_)) => Err(ApiError::PlayerUnavailable),
            Err(_) => {
                tracing::warn!(command = %name, "Player reply timed out");
                Err(ApiError::PlayerTimeout(timeout.as_secs()))
            }
        }
    }
}

/// Sending half of the player event channel
pub type EventSender = mpsc::UnboundedSender<PlayerEvent>;

/// Receiving half of the player event channel, consumed by the hub
pub type EventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

/// Create the player event channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_command_wire_format() {
        let value = serde_json::to_value(PlayerCommand::SeekTo { seconds: 12.5 }).unwrap();
        assert_eq!(value, json!({"name": "seek-to", "seconds": 12.5}));

        let value = serde_json::to_value(PlayerCommand::AddToQueue {
            video_id: "abc".to_string(),
            insert_position: InsertPosition::InsertAfterCurrentVideo,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "name": "add-to-queue",
                "videoId": "abc",
                "insertPosition": "INSERT_AFTER_CURRENT_VIDEO"
            })
        );

        assert_eq!(PlayerCommand::TogglePlay.name(), "toggle-play");
    }

    #[tokio::test]
    async fn test_send_reaches_receiver() {
        let (handle, mut rx) = PlayerHandle::channel();
        handle.send(PlayerCommand::Next).unwrap();

        let request = rx.recv().await.unwrap();
        assert_eq!(request.command, PlayerCommand::Next);
        assert!(request.reply.is_none());
    }

    #[tokio::test]
    async fn test_send_without_player_fails() {
        let (handle, rx) = PlayerHandle::channel();
        drop(rx);
        assert!(!handle.is_connected());
        assert_matches!(
            handle.send(PlayerCommand::Play),
            Err(ApiError::PlayerUnavailable)
        );
    }

    #[tokio::test]
    async fn test_request_returns_reply() {
        let (handle, mut rx) = PlayerHandle::channel();
        tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            request.respond(Ok(json!({"items": []})));
        });

        let value = handle.request(PlayerCommand::GetQueue).await.unwrap();
        assert_eq!(value, json!({"items": []}));
    }

    #[tokio::test]
    async fn test_request_maps_player_error() {
        let (handle, mut rx) = PlayerHandle::channel();
        tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            request.respond(Err("no such index".to_string()));
        });

        let result = handle.request(PlayerCommand::RemoveFromQueue { index: 9 }).await;
        assert_matches!(result, Err(ApiError::PlayerCommandFailed(msg)) if msg == "no such index");
    }

    #[tokio::test]
    async fn test_request_times_out() {
        let (handle, mut rx) = PlayerHandle::channel();
        let handle = handle.with_reply_timeout(Duration::from_millis(20));

        // Keep the request alive without answering it
        let keeper = tokio::spawn(async move {
            let request = rx.recv().await;
            tokio::time::sleep(Duration::from_secs(1)).await;
            drop(request);
        });

        let result = handle.request(PlayerCommand::GetPlaylists).await;
        assert_matches!(result, Err(ApiError::PlayerTimeout(_)));
        keeper.abort();
    }

    #[tokio::test]
    async fn test_dropped_request_is_unavailable() {
        let (handle, mut rx) = PlayerHandle::channel();
        tokio::spawn(async move {
            let _ = rx.recv().await;
        });

        let result = handle.request(PlayerCommand::GetQueue).await;
        assert_matches!(result, Err(ApiError::PlayerUnavailable));
    }
}

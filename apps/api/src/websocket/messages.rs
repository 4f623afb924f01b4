//! Real-time message protocol
//!
//! Server to client only. Every frame is a JSON object with a `type` field.
//! A connection first receives one `PLAYER_INFO` snapshot and then one delta
//! per player event, in event order.

use serde::{Deserialize, Serialize};

use crate::models::{LikeStatus, PlayerEvent, PlayerState, RepeatMode, SongInfo};

/// Full player state sent once on connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub song: Option<SongInfo>,
    pub is_playing: bool,
    pub muted: bool,
    pub position: u64,
    pub volume: u8,
    pub repeat: RepeatMode,
    pub shuffle: bool,
    pub like_status: Option<LikeStatus>,
}

impl From<&PlayerState> for PlayerSnapshot {
    fn from(state: &PlayerState) -> Self {
        Self {
            song: state.song.clone(),
            is_playing: state.is_playing(),
            muted: state.volume.is_muted,
            position: state.position(),
            volume: state.volume.volume,
            repeat: state.repeat,
            shuffle: state.shuffle,
            like_status: state.like_status,
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// Full state snapshot
    PlayerInfo(PlayerSnapshot),

    #[serde(rename_all = "camelCase")]
    VideoChanged {
        song: SongInfo,
        position: u64,
        is_playing: bool,
    },

    #[serde(rename_all = "camelCase")]
    PlayerStateChanged { is_playing: bool, position: u64 },

    PositionChanged { position: u64 },

    VolumeChanged { volume: u8, muted: bool },

    RepeatChanged { repeat: RepeatMode },

    ShuffleChanged { shuffle: bool },

    QueueChanged,

    #[serde(rename_all = "camelCase")]
    LikeChanged { like_status: LikeStatus },
}

impl ServerMessage {
    /// Snapshot message for the given state
    pub fn snapshot(state: &PlayerState) -> Self {
        Self::PlayerInfo(PlayerSnapshot::from(state))
    }

    /// Delta for an event, given the state after the event was applied
    pub fn delta(event: &PlayerEvent, state: &PlayerState) -> Self {
        match event {
            PlayerEvent::VideoChanged(song) => Self::VideoChanged {
                song: state.song.clone().unwrap_or_else(|| song.clone()),
                position: 0,
                is_playing: state.is_playing(),
            },
            PlayerEvent::PlayOrPaused { .. } => Self::PlayerStateChanged {
                is_playing: state.is_playing(),
                position: state.position(),
            },
            // The player's reported time, even with no song or a live stream
            PlayerEvent::TimeChanged { elapsed_seconds }
            | PlayerEvent::Seeked { elapsed_seconds } => Self::PositionChanged {
                position: *elapsed_seconds,
            },
            PlayerEvent::VolumeChanged(_) => Self::VolumeChanged {
                volume: state.volume.volume,
                muted: state.volume.is_muted,
            },
            PlayerEvent::RepeatChanged(_) => Self::RepeatChanged {
                repeat: state.repeat,
            },
            PlayerEvent::ShuffleChanged(_) => Self::ShuffleChanged {
                shuffle: state.shuffle,
            },
            PlayerEvent::QueueChanged => Self::QueueChanged,
            PlayerEvent::LikeChanged(status) => Self::LikeChanged {
                like_status: state.like_status.unwrap_or(*status),
            },
        }
    }

    /// Wire name of the message type
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::PlayerInfo(_) => "PLAYER_INFO",
            Self::VideoChanged { .. } => "VIDEO_CHANGED",
            Self::PlayerStateChanged { .. } => "PLAYER_STATE_CHANGED",
            Self::PositionChanged { .. } => "POSITION_CHANGED",
            Self::VolumeChanged { .. } => "VOLUME_CHANGED",
            Self::RepeatChanged { .. } => "REPEAT_CHANGED",
            Self::ShuffleChanged { .. } => "SHUFFLE_CHANGED",
            Self::QueueChanged => "QUEUE_CHANGED",
            Self::LikeChanged { .. } => "LIKE_CHANGED",
        }
    }

    /// Fold this message into a client-side copy of the state
    ///
    /// A client that applies the snapshot and then every delta in order ends
    /// up with the same observable state as the server.
    pub fn apply_to(&self, state: &mut PlayerState) {
        match self {
            Self::PlayerInfo(snapshot) => {
                state.song = snapshot.song.clone();
                state.volume.volume = snapshot.volume;
                state.volume.is_muted = snapshot.muted;
                state.repeat = snapshot.repeat;
                state.shuffle = snapshot.shuffle;
                state.like_status = snapshot.like_status;
            }
            Self::VideoChanged { song, position, .. } => {
                state.song = Some(SongInfo {
                    elapsed_seconds: *position,
                    ..song.clone()
                });
            }
            Self::PlayerStateChanged {
                is_playing,
                position,
            } => {
                if let Some(song) = state.song.as_mut() {
                    song.is_paused = !is_playing;
                    song.elapsed_seconds = *position;
                }
            }
            Self::PositionChanged { position } => {
                if let Some(song) = state.song.as_mut() {
                    song.elapsed_seconds = *position;
                }
            }
            Self::VolumeChanged { volume, muted } => {
                state.volume.volume = *volume;
                state.volume.is_muted = *muted;
            }
            Self::RepeatChanged { repeat } => state.repeat = *repeat,
            Self::ShuffleChanged { shuffle } => state.shuffle = *shuffle,
            Self::QueueChanged => {}
            Self::LikeChanged { like_status } => state.like_status = Some(*like_status),
        }
    }
}

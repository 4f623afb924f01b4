//! Player state model
//!
//! `PlayerState` is the gateway's view of the media player. It only ever
//! changes by applying a [`PlayerEvent`], which keeps fields belonging to one
//! song from leaking into another.

use serde::{Deserialize, Serialize};

/// Metadata and progress of the loaded media
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInfo {
    /// Player-specific media id
    #[serde(rename = "videoId")]
    pub id: String,

    pub title: String,

    pub artist: String,

    /// Artwork image URI
    #[serde(rename = "imageSrc", default)]
    pub artwork_url: Option<String>,

    /// Total duration in seconds
    #[serde(rename = "songDuration")]
    pub duration_seconds: u64,

    pub is_paused: bool,

    /// Live streams have no meaningful elapsed time
    #[serde(default)]
    pub is_live: bool,

    #[serde(default)]
    pub elapsed_seconds: u64,
}

impl SongInfo {
    /// Playback position, zero for live streams
    pub fn position(&self) -> u64 {
        if self.is_live {
            0
        } else {
            self.elapsed_seconds
        }
    }
}

/// Volume level and mute flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeState {
    /// Volume level (0 - 100)
    pub volume: u8,

    pub is_muted: bool,
}

impl Default for VolumeState {
    fn default() -> Self {
        Self {
            volume: 100,
            is_muted: false,
        }
    }
}

/// Repeat mode options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RepeatMode {
    #[default]
    None,
    All,
    One,
}

/// Like status of the current song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LikeStatus {
    Like,
    Dislike,
    Indifferent,
}

/// A state-change notification emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum PlayerEvent {
    /// New media loaded
    VideoChanged(SongInfo),

    /// Playback paused or resumed
    #[serde(rename_all = "camelCase")]
    PlayOrPaused { is_paused: bool, elapsed_seconds: u64 },

    /// Periodic position tick
    #[serde(rename_all = "camelCase")]
    TimeChanged { elapsed_seconds: u64 },

    /// User seeked to a new position
    #[serde(rename_all = "camelCase")]
    Seeked { elapsed_seconds: u64 },

    VolumeChanged(VolumeState),

    RepeatChanged(RepeatMode),

    ShuffleChanged(bool),

    /// Queue contents changed; clients re-fetch it on demand
    QueueChanged,

    LikeChanged(LikeStatus),
}

impl PlayerEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VideoChanged(_) => "video-changed",
            Self::PlayOrPaused { .. } => "play-or-paused",
            Self::TimeChanged { .. } => "time-changed",
            Self::Seeked { .. } => "seeked",
            Self::VolumeChanged(_) => "volume-changed",
            Self::RepeatChanged(_) => "repeat-changed",
            Self::ShuffleChanged(_) => "shuffle-changed",
            Self::QueueChanged => "queue-changed",
            Self::LikeChanged(_) => "like-changed",
        }
    }
}

/// Latest known player state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Loaded media, `None` when nothing is loaded
    pub song: Option<SongInfo>,

    pub volume: VolumeState,

    pub repeat: RepeatMode,

    pub shuffle: bool,

    /// `None` while the like status is unknown
    pub like_status: Option<LikeStatus>,
}

impl PlayerState {
    /// Whether media is loaded and not paused
    pub fn is_playing(&self) -> bool {
        self.song.as_ref().is_some_and(|song| !song.is_paused)
    }

    /// Playback position in seconds (0 with no song or a live stream)
    pub fn position(&self) -> u64 {
        self.song.as_ref().map(SongInfo::position).unwrap_or(0)
    }

    /// Apply a player event
    ///
    /// A video change replaces the song and its elapsed time together.
    /// Progress events without a loaded song leave the state untouched.
    pub fn apply(&mut self, event: &PlayerEvent) {
        match event {
            PlayerEvent::VideoChanged(song) => {
                self.song = Some(SongInfo {
                    elapsed_seconds: 0,
                    ..song.clone()
                });
            }
            PlayerEvent::PlayOrPaused {
                is_paused,
                elapsed_seconds,
            } => {
                if let Some(song) = self.song.as_mut() {
                    song.is_paused = *is_paused;
                    song.elapsed_seconds = *elapsed_seconds;
                }
            }
            PlayerEvent::TimeChanged { elapsed_seconds }
            | PlayerEvent::Seeked { elapsed_seconds } => {
                if let Some(song) = self.song.as_mut() {
                    song.elapsed_seconds = *elapsed_seconds;
                }
            }
            PlayerEvent::VolumeChanged(volume) => {
                self.volume = VolumeState {
                    volume: volume.volume.min(100),
                    is_muted: volume.is_muted,
                };
            }
            PlayerEvent::RepeatChanged(mode) => self.repeat = *mode,
            PlayerEvent::ShuffleChanged(shuffle) => self.shuffle = *shuffle,
            PlayerEvent::QueueChanged => {}
            PlayerEvent::LikeChanged(status) => self.like_status = Some(*status),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::SongInfo;

    pub fn song(id: &str, duration_seconds: u64) -> SongInfo {
        SongInfo {
            id: id.to_string(),
            title: format!("Title {}", id),
            artist: "Artist".to_string(),
            artwork_url: Some(format!("https://img.example/{}.jpg", id)),
            duration_seconds,
            is_paused: false,
            is_live: false,
            elapsed_seconds: 0,
        }
    }
}

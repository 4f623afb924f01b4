//! Control API route handlers
//!
//! Mounted under `/api/v1` behind the Auth Gate. GET handlers answer from the
//! State Mirror; everything else is translated into a [`PlayerCommand`].
//!
//! - `GET /song`, `/volume`, `/like-state`, `/repeat-mode`, `/shuffle`
//! - `POST /play`, `/pause`, `/toggle-play`, `/previous`, `/next`
//! - `POST /seek-to`, `/go-back`, `/go-forward`
//! - `POST /volume`, `/toggle-mute`, `/like`, `/dislike`, `/switch-repeat`, `/shuffle`
//! - `POST /play-now`
//! - `GET|POST|PATCH|DELETE /queue`, `PATCH|DELETE /queue/:index`
//! - `POST /search`
//! - `GET /playlists`, `POST /playlists/:id/play`

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::{LikeStatus, RepeatMode, VolumeState};
use crate::services::player::InsertPosition;
use crate::services::PlayerCommand;
use crate::state::AppState;

/// Create the control router
pub fn control_router() -> Router<AppState> {
    Router::new()
        .route("/song", get(get_song))
        .route("/volume", get(get_volume).post(set_volume))
        .route("/like-state", get(get_like_state))
        .route("/repeat-mode", get(get_repeat_mode))
        .route("/shuffle", get(get_shuffle).post(shuffle))
        .route("/play", post(play))
        .route("/pause", post(pause))
        .route("/toggle-play", post(toggle_play))
        .route("/previous", post(previous))
        .route("/next", post(next))
        .route("/seek-to", post(seek_to))
        .route("/go-back", post(go_back))
        .route("/go-forward", post(go_forward))
        .route("/toggle-mute", post(toggle_mute))
        .route("/like", post(like))
        .route("/dislike", post(dislike))
        .route("/switch-repeat", post(switch_repeat))
        .route("/play-now", post(play_now))
        .route(
            "/queue",
            get(get_queue)
                .post(add_to_queue)
                .patch(set_queue_index)
                .delete(clear_queue),
        )
        .route(
            "/queue/:index",
            patch(move_in_queue).delete(remove_from_queue),
        )
        .route("/search", post(search))
        .route("/playlists", get(get_playlists))
        .route("/playlists/:id/play", post(play_playlist))
}

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
struct SecondsRequest {
    seconds: f64,
}

#[derive(Debug, Deserialize)]
struct VolumeRequest {
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct SwitchRepeatRequest {
    iteration: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRequest {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddToQueueRequest {
    video_id: String,
    #[serde(default)]
    insert_position: InsertPosition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveInQueueRequest {
    to_index: usize,
}

#[derive(Debug, Deserialize)]
struct QueueIndexRequest {
    index: usize,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    params: Option<String>,
    #[serde(default)]
    continuation: Option<String>,
}

#[derive(Debug, Serialize)]
struct StateResponse<T> {
    state: T,
}

#[derive(Debug, Serialize)]
struct RepeatModeResponse {
    mode: RepeatMode,
}

// =============================================================================
// Queries answered from the State Mirror
// =============================================================================

/// Current song, or 204 when nothing is loaded
async fn get_song(State(state): State<AppState>) -> Response {
    match state.mirror.with_state(|s| s.song.clone()) {
        Some(song) => Json(song).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn get_volume(State(state): State<AppState>) -> Json<VolumeState> {
    Json(state.mirror.with_state(|s| s.volume))
}

async fn get_like_state(State(state): State<AppState>) -> Json<StateResponse<Option<LikeStatus>>> {
    Json(StateResponse {
        state: state.mirror.with_state(|s| s.like_status),
    })
}

async fn get_repeat_mode(State(state): State<AppState>) -> Json<RepeatModeResponse> {
    Json(RepeatModeResponse {
        mode: state.mirror.with_state(|s| s.repeat),
    })
}

async fn get_shuffle(State(state): State<AppState>) -> Json<StateResponse<bool>> {
    Json(StateResponse {
        state: state.mirror.with_state(|s| s.shuffle),
    })
}

// =============================================================================
// Playback commands
// =============================================================================

/// Send a fire-and-forget command and answer 204
fn dispatch(state: &AppState, command: PlayerCommand) -> ApiResult<StatusCode> {
    state.player.send(command)?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_seconds(seconds: f64) -> ApiResult<f64> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(ApiError::ValidationError(
            "seconds must be a non-negative number".to_string(),
        ))
    }
}

async fn play(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::Play)
}

async fn pause(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::Pause)
}

async fn toggle_play(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::TogglePlay)
}

async fn previous(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::Previous)
}

async fn next(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::Next)
}

async fn seek_to(
    State(state): State<AppState>,
    payload: Result<Json<SecondsRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    let seconds = validate_seconds(body.seconds)?;
    dispatch(&state, PlayerCommand::SeekTo { seconds })
}

async fn go_back(
    State(state): State<AppState>,
    payload: Result<Json<SecondsRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    let seconds = validate_seconds(body.seconds)?;
    dispatch(&state, PlayerCommand::GoBack { seconds })
}

async fn go_forward(
    State(state): State<AppState>,
    payload: Result<Json<SecondsRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    let seconds = validate_seconds(body.seconds)?;
    dispatch(&state, PlayerCommand::GoForward { seconds })
}

async fn set_volume(
    State(state): State<AppState>,
    payload: Result<Json<VolumeRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    if !(0.0..=100.0).contains(&body.volume) {
        return Err(ApiError::ValidationError(
            "volume must be between 0 and 100".to_string(),
        ));
    }
    dispatch(
        &state,
        PlayerCommand::SetVolume {
            volume: body.volume.round() as u8,
        },
    )
}

async fn toggle_mute(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::ToggleMute)
}

async fn like(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::ToggleLike)
}

async fn dislike(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::ToggleDislike)
}

async fn switch_repeat(
    State(state): State<AppState>,
    payload: Result<Json<SwitchRepeatRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    dispatch(
        &state,
        PlayerCommand::SwitchRepeat {
            iteration: body.iteration,
        },
    )
}

async fn shuffle(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::Shuffle)
}

async fn play_now(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    dispatch(
        &state,
        PlayerCommand::PlayNow {
            video_id: body.video_id,
        },
    )
}

// =============================================================================
// Queue, search and playlists
// =============================================================================

async fn get_queue(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let queue = state.player.request(PlayerCommand::GetQueue).await?;
    Ok(Json(queue))
}

async fn add_to_queue(
    State(state): State<AppState>,
    payload: Result<Json<AddToQueueRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    dispatch(
        &state,
        PlayerCommand::AddToQueue {
            video_id: body.video_id,
            insert_position: body.insert_position,
        },
    )
}

async fn move_in_queue(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    payload: Result<Json<MoveInQueueRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    dispatch(
        &state,
        PlayerCommand::MoveInQueue {
            from_index: index,
            to_index: body.to_index,
        },
    )
}

async fn set_queue_index(
    State(state): State<AppState>,
    payload: Result<Json<QueueIndexRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = payload?;
    dispatch(&state, PlayerCommand::SetQueueIndex { index: body.index })
}

async fn remove_from_queue(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::RemoveFromQueue { index })
}

async fn clear_queue(State(state): State<AppState>) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::ClearQueue)
}

async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    if body.query.trim().is_empty() {
        return Err(ApiError::ValidationError("query cannot be empty".to_string()));
    }

    let results = state
        .player
        .request(PlayerCommand::Search {
            query: body.query,
            params: body.params,
            continuation: body.continuation,
        })
        .await?;
    Ok(Json(results))
}

async fn get_playlists(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let playlists = state.player.request(PlayerCommand::GetPlaylists).await?;
    Ok(Json(playlists))
}

async fn play_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> ApiResult<StatusCode> {
    dispatch(&state, PlayerCommand::PlayPlaylist { playlist_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_seconds() {
        assert_eq!(validate_seconds(12.5).unwrap(), 12.5);
        assert_eq!(validate_seconds(0.0).unwrap(), 0.0);
        assert!(validate_seconds(-1.0).is_err());
        assert!(validate_seconds(f64::NAN).is_err());
        assert!(validate_seconds(f64::INFINITY).is_err());
    }

    #[test]
    fn test_add_to_queue_defaults_to_end() {
        let body: AddToQueueRequest = serde_json::from_str(r#"{"videoId":"abc"}"#).unwrap();
        assert_eq!(body.insert_position, InsertPosition::InsertAtEnd);
    }
}

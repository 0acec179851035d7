//! Narration routes

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::extract::{JsonBody, OptionalJson};
use crate::error::Result;
use crate::session::SessionId;
use crate::speech::NarrationStatus;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    /// Single page to read (1-indexed); reads from the current page on when absent
    pub page: Option<usize>,
    pub rate: Option<u32>,
    pub volume: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoiceRequest {
    pub rate: Option<u32>,
    pub volume: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct SpeechResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: NarrationStatus,
}

impl From<NarrationStatus> for SpeechResponse {
    fn from(status: NarrationStatus) -> Self {
        Self {
            success: true,
            status,
        }
    }
}

async fn play(
    State(state): State<AppState>,
    session_id: SessionId,
    OptionalJson(request): OptionalJson<PlayRequest>,
) -> Result<Json<SpeechResponse>> {
    let session = state.sessions().get(&session_id);
    let mut session = session.write().await;

    session.narrator().update_voice(request.rate, request.volume);

    let status = session.narrator().status();
    if status.state.is_active() {
        return Ok(Json(status.into()));
    }

    let pages = session.narration_pages(request.page).await?;
    let status = session.narrator_mut().start(pages)?;
    tracing::info!(
        session = %session_id.0,
        page = ?status.page,
        sentences = status.total_sentences,
        "Narration started"
    );

    Ok(Json(status.into()))
}

/// Pause while playing, resume while paused
async fn pause(
    State(state): State<AppState>,
    session_id: SessionId,
) -> Result<Json<SpeechResponse>> {
    let session = state.sessions().get(&session_id);
    let status = session.write().await.narrator_mut().toggle_pause()?;
    Ok(Json(status.into()))
}

async fn stop(State(state): State<AppState>, session_id: SessionId) -> Json<SpeechResponse> {
    let session = state.sessions().get(&session_id);
    let status = session.write().await.narrator_mut().stop();
    Json(status.into())
}

async fn update_settings(
    State(state): State<AppState>,
    session_id: SessionId,
    JsonBody(request): JsonBody<VoiceRequest>,
) -> Json<SpeechResponse> {
    let session = state.sessions().get(&session_id);
    let status = session
        .read()
        .await
        .narrator()
        .update_voice(request.rate, request.volume);
    Json(status.into())
}

async fn status(State(state): State<AppState>, session_id: SessionId) -> Json<SpeechResponse> {
    let session = state.sessions().get(&session_id);
    let status = session.read().await.narrator().status();
    Json(status.into())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/play", post(play))
        .route("/pause", post(pause))
        .route("/stop", post(stop))
        .route("/settings", put(update_settings))
        .route("/status", get(status))
}

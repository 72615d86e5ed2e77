use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{authenticate, load_owned_video, parse_video_id, video_to_response, VideoResponse};
use crate::api::response::{ApiError, AppJson, AppQuery, JSend, Page, Pagination};
use crate::storage::models::VideoRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListVideosParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_video(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppJson(req): AppJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<JSend<VideoResponse>>), ApiError> {
    let user_id = authenticate(&headers, &state)?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let video = VideoRecord::new(user_id, title, req.description);
    state
        .db
        .create_video(&video)
        .map_err(|e| ApiError::internal_cause("Couldn't create video", e))?;

    tracing::debug!(video_id = %video.id, user_id = %user_id, "Created video");
    Ok((
        StatusCode::CREATED,
        JSend::success(video_to_response(&state, &video).await?),
    ))
}

pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<JSend<VideoResponse>>, ApiError> {
    let video_id = parse_video_id(&raw_id)?;
    let user_id = authenticate(&headers, &state)?;
    let video = load_owned_video(&state, video_id, user_id)?;

    Ok(JSend::success(video_to_response(&state, &video).await?))
}

pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    AppQuery(params): AppQuery<ListVideosParams>,
) -> Result<Json<JSend<Page<VideoResponse>>>, ApiError> {
    let user_id = authenticate(&headers, &state)?;

    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let videos = state
        .db
        .list_videos_for_user(user_id)
        .map_err(|e| ApiError::internal_cause("Couldn't retrieve videos", e))?;

    let total = videos.len() as u64;
    let mut items = Vec::new();
    for video in videos
        .iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
    {
        items.push(video_to_response(&state, video).await?);
    }

    Ok(JSend::page(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
            total,
        },
    ))
}

pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<JSend<()>>, ApiError> {
    let video_id = parse_video_id(&raw_id)?;
    let user_id = authenticate(&headers, &state)?;
    let video = load_owned_video(&state, video_id, user_id)?;

    // Phase 1: Remove metadata
    state
        .db
        .delete_video(video_id)
        .map_err(|e| ApiError::internal_cause("Couldn't delete video", e))?;

    // Phase 2: Delete stored objects (best-effort)
    let stored = [
        (state.object_store.as_ref(), video.video_location.as_ref()),
        (state.assets.as_ref(), video.thumbnail_location.as_ref()),
    ];
    for (store, location) in stored {
        let Some(location) = location.filter(|l| l.bucket == store.bucket()) else {
            continue;
        };
        if let Err(e) = store.delete(&location.key).await {
            tracing::warn!(
                video_id = %video_id,
                location = %location,
                error = %e,
                "Failed to delete stored object"
            );
        }
    }

    tracing::debug!(video_id = %video_id, "Deleted video");
    Ok(JSend::success(()))
}

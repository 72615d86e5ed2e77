mod admin;
mod uploads;
mod videos;

use axum::http::HeaderMap;
use serde::Serialize;
use uuid::Uuid;

use crate::api::response::ApiError;
use crate::auth;
use crate::storage::models::{Replaced, VideoRecord};
use crate::storage::DatabaseError;
use crate::AppState;

pub use admin::health;
pub use uploads::{upload_thumbnail, upload_video};
pub use videos::{create_video, delete_video, get_video, list_videos};

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub created_at: String,
    pub description: Option<String>,
    pub id: Uuid,
    pub thumbnail_url: Option<String>,
    pub title: String,
    pub updated_at: String,
    pub user_id: Uuid,
    pub video_url: Option<String>,
}

fn parse_video_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid ID"))
}

/// Resolve the caller's user id from the bearer token.
fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<Uuid, ApiError> {
    let token = auth::get_bearer_token(headers).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request without bearer token");
        ApiError::unauthorized("Couldn't find JWT")
    })?;

    auth::validate_jwt(token, &state.config.auth.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected invalid bearer token");
        ApiError::unauthorized("Couldn't validate JWT")
    })
}

/// Fetch a video, rejecting callers that do not own it.
fn load_owned_video(
    state: &AppState,
    video_id: Uuid,
    user_id: Uuid,
) -> Result<VideoRecord, ApiError> {
    let video = state
        .db
        .get_video(video_id)
        .map_err(|e| ApiError::internal_cause("Couldn't get video", e))?
        .ok_or_else(|| ApiError::bad_request("Couldn't get video"))?;

    if !video.is_owned_by(user_id) {
        tracing::warn!(video_id = %video_id, user_id = %user_id, "Rejected access by non-owner");
        return Err(ApiError::unauthorized("Unauthorized"));
    }
    Ok(video)
}

/// Unwrap a field-level update. A record deleted since it was loaded is a 400,
/// the same as one that never existed.
fn updated_video(
    result: Result<Option<Replaced>, DatabaseError>,
) -> Result<Replaced, ApiError> {
    result
        .map_err(|e| ApiError::internal_cause("Couldn't update video", e))?
        .ok_or_else(|| ApiError::bad_request("Couldn't get video"))
}

/// Build the client view of a record, turning the stored object location into
/// a URL the client can fetch.
async fn video_to_response(state: &AppState, video: &VideoRecord) -> Result<VideoResponse, ApiError> {
    let video_url = match &video.video_location {
        Some(location) => Some(
            state
                .object_store
                .retrieval_url(location, state.config.storage.signed_url_ttl)
                .await
                .map_err(|e| ApiError::internal_cause("Failed to generate resource url", e))?,
        ),
        None => None,
    };

    Ok(VideoResponse {
        created_at: video.created_at.to_rfc3339(),
        description: video.description.clone(),
        id: video.id,
        thumbnail_url: video.thumbnail_url.clone(),
        title: video.title.clone(),
        updated_at: video.updated_at.to_rfc3339(),
        user_id: video.user_id,
        video_url,
    })
}

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    authenticate, load_owned_video, parse_video_id, updated_video, video_to_response,
    VideoResponse,
};
use crate::api::response::{ApiError, JSend};
use crate::media::{AspectRatio, ThumbnailFormat, VideoFormat};
use crate::object_store::{generate_object_key, ObjectLocation, ObjectStore};
use crate::staging::{StagedUpload, StagingError};
use crate::AppState;

/// Objects are always stored as MP4: the faststart rewrite remuxes into that container.
const STORED_VIDEO_EXTENSION: &str = "mp4";
const STORED_VIDEO_CONTENT_TYPE: &str = "video/mp4";

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    request: Request,
) -> Result<Json<JSend<VideoResponse>>, ApiError> {
    let video_id = parse_video_id(&raw_id)?;
    let user_id = authenticate(request.headers(), &state)?;
    load_owned_video(&state, video_id, user_id)?;

    tracing::info!(video_id = %video_id, user_id = %user_id, "Uploading thumbnail");

    let mut multipart = read_multipart(request).await?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("thumbnail") {
            continue;
        }

        let format = field
            .file_name()
            .and_then(ThumbnailFormat::from_filename)
            .ok_or_else(|| ApiError::bad_request("Unsupported file type"))?;
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((format, data));
        break;
    }
    let (format, data) =
        upload.ok_or_else(|| ApiError::bad_request("thumbnail field is required"))?;

    let key = format!("{video_id}.{}", format.extension());
    state
        .assets
        .put(&key, data, &format.mime_type())
        .await
        .map_err(|e| ApiError::internal_cause("Unable to store file", e))?;

    let location = state.assets.location(&key);
    let thumbnail_url = state
        .assets
        .retrieval_url(&location, state.config.storage.signed_url_ttl)
        .await
        .map_err(|e| ApiError::internal_cause("Failed to generate thumbnail url", e))?;

    let replaced = updated_video(state.db.set_thumbnail(video_id, thumbnail_url, location))?;

    // A thumbnail with a different extension lives under a different key
    if let Some(previous) = replaced.previous.filter(|p| p.key != key) {
        remove_replaced(state.assets.as_ref(), video_id, &previous).await;
    }

    tracing::debug!(video_id = %video_id, key = %key, "Stored thumbnail");
    Ok(JSend::success(video_to_response(&state, &replaced.video).await?))
}

pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    request: Request,
) -> Result<Json<JSend<VideoResponse>>, ApiError> {
    let video_id = parse_video_id(&raw_id)?;
    let user_id = authenticate(request.headers(), &state)?;
    load_owned_video(&state, video_id, user_id)?;

    tracing::info!(video_id = %video_id, user_id = %user_id, "Uploading video");

    let mut multipart = read_multipart(request).await?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("video") {
            continue;
        }

        let format = field
            .file_name()
            .and_then(VideoFormat::from_filename)
            .ok_or_else(|| ApiError::bad_request("Unsupported file type"))?;
        let staged = StagedUpload::from_field(
            field,
            &state.config.media.staging_dir,
            format.extension(),
            state.config.max_video_size,
        )
        .await
        .map_err(staging_error)?;
        upload = Some(staged);
        break;
    }
    let staged = upload.ok_or_else(|| ApiError::bad_request("video field is required"))?;

    let dimensions = state
        .media_tools
        .probe_dimensions(staged.path())
        .await
        .map_err(|e| ApiError::internal_cause("Failed processing video", e))?;
    let ratio = AspectRatio::classify(dimensions.width, dimensions.height);

    let processed = state
        .media_tools
        .faststart(staged.path())
        .await
        .map_err(|e| ApiError::internal_cause("Failed processing video", e))?;

    let key = generate_object_key(ratio.key_prefix(), STORED_VIDEO_EXTENSION)
        .map_err(|e| ApiError::internal_cause("Failed to generate object key", e))?;

    state
        .object_store
        .put_file(&key, &processed, STORED_VIDEO_CONTENT_TYPE)
        .await
        .map_err(|e| ApiError::internal_cause("Failed to upload video", e))?;

    let location = state.object_store.location(&key);
    tracing::info!(
        video_id = %video_id,
        location = %location,
        aspect_ratio = ratio.label(),
        byte_size = staged.byte_size(),
        "Uploaded video"
    );

    // Re-read and write the record in one transaction: the upload above can
    // take long enough for other fields to change underneath it
    let replaced = match updated_video(state.db.set_video_location(video_id, location.clone())) {
        Ok(replaced) => replaced,
        Err(e) => {
            // Best-effort cleanup of the uploaded object
            remove_replaced(state.object_store.as_ref(), video_id, &location).await;
            return Err(e);
        }
    };

    if let Some(previous) = replaced.previous {
        remove_replaced(state.object_store.as_ref(), video_id, &previous).await;
    }

    Ok(JSend::success(video_to_response(&state, &replaced.video).await?))
}

// ============================================================================
// Helpers
// ============================================================================

async fn read_multipart(request: Request) -> Result<Multipart, ApiError> {
    Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text())))
}

/// Any failure reading the form, including a body over the route's limit, is a 400.
fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::bad_request(format!("Unable to parse form: {}", e.body_text()))
}

fn staging_error(e: StagingError) -> ApiError {
    match e {
        StagingError::TooLarge { limit } => {
            ApiError::bad_request(format!("Exceeded maximum size of {limit} bytes"))
        }
        StagingError::Read(e) => multipart_error(e),
        StagingError::Io(e) => ApiError::internal_cause("Unable to stage upload", e),
    }
}

/// Delete an object a record no longer points at. Objects in another bucket
/// are left alone.
async fn remove_replaced(store: &dyn ObjectStore, video_id: Uuid, location: &ObjectLocation) {
    if location.bucket != store.bucket() {
        return;
    }
    if let Err(e) = store.delete(&location.key).await {
        tracing::warn!(
            video_id = %video_id,
            location = %location,
            error = %e,
            "Failed to delete replaced object"
        );
    }
}

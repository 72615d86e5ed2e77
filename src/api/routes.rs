use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{handlers, ASSETS_MOUNT, MEDIA_MOUNT};
use crate::config::StorageBackend;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let thumbnail_limit = state.config.max_thumbnail_size as usize;
    let video_limit = state.config.max_video_size as usize;

    let mut router = Router::new()
        // Uploads
        .route(
            "/api/thumbnail_upload/:video_id",
            post(handlers::upload_thumbnail).layer(DefaultBodyLimit::max(thumbnail_limit)),
        )
        .route(
            "/api/video_upload/:video_id",
            post(handlers::upload_video).layer(DefaultBodyLimit::max(video_limit)),
        )
        // Videos
        .route(
            "/api/videos",
            get(handlers::list_videos).post(handlers::create_video),
        )
        .route(
            "/api/videos/:video_id",
            get(handlers::get_video).delete(handlers::delete_video),
        )
        // Internal
        .route("/_internal/health", get(handlers::health))
        // Static content
        .nest_service(ASSETS_MOUNT, ServeDir::new(&state.config.storage.assets_root));

    if state.config.storage.backend == StorageBackend::Local {
        router = router.nest_service(
            MEDIA_MOUNT,
            ServeDir::new(&state.config.storage.local_storage_path),
        );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

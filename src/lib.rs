//! tubely - A small video hosting backend
//!
//! This crate provides authenticated thumbnail and video uploads with:
//! - Swappable object storage backends (local filesystem, S3)
//! - faststart rewriting and aspect-ratio classification via ffmpeg/ffprobe
//! - redb embedded database for video metadata
//! - REST API with multipart upload support

pub mod api;
pub mod auth;
pub mod config;
pub mod media;
pub mod object_store;
pub mod processing;
pub mod staging;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use object_store::ObjectStore;
use processing::MediaTools;
use storage::VideoRepository;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn VideoRepository>,
    /// Thumbnail images, served under /assets
    pub assets: Arc<dyn ObjectStore>,
    /// Video objects
    pub object_store: Arc<dyn ObjectStore>,
    pub media_tools: Arc<dyn MediaTools>,
}

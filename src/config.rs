use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    /// Maximum thumbnail request body in bytes
    pub max_thumbnail_size: u64,
    /// Maximum video request body in bytes
    pub max_video_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Externally reachable base URL, used to build asset links.
    pub public_base_url: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackend::Local => "local",
            StorageBackend::S3 => "s3",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory thumbnails are written to and served from under /assets
    pub assets_root: String,
    /// Directory for the local video backend, served under /media
    pub local_storage_path: String,
    /// S3 bucket name (required when backend is s3)
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub s3_endpoint: Option<String>,
    /// Lifetime of presigned retrieval URLs
    pub signed_url_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Parent of the per-upload scratch directories
    pub staging_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8091".to_string(),
            public_base_url: "http://localhost:8091".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            assets_root: "./assets".to_string(),
            local_storage_path: "./media".to_string(),
            s3_bucket: None,
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            signed_url_ttl: Duration::from_secs(300),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            staging_dir: std::env::temp_dir(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        let bind_address = std::env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address);
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.public_base_url);
        let data_dir = std::env::var("DATA_DIR").unwrap_or(defaults.data_dir);

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => StorageBackend::S3,
            _ => StorageBackend::Local,
        };

        let storage_defaults = StorageConfig::default();
        let assets_root = std::env::var("ASSETS_ROOT").unwrap_or(storage_defaults.assets_root);
        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or(storage_defaults.local_storage_path);
        let s3_bucket = std::env::var("S3_BUCKET").ok().filter(|b| !b.is_empty());
        let s3_region = std::env::var("S3_REGION").unwrap_or(storage_defaults.s3_region);
        let s3_endpoint = std::env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty());
        let signed_url_ttl = std::env::var("SIGNED_URL_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(storage_defaults.signed_url_ttl);

        let media_defaults = MediaConfig::default();
        let ffmpeg_path = std::env::var("FFMPEG_PATH").unwrap_or(media_defaults.ffmpeg_path);
        let ffprobe_path = std::env::var("FFPROBE_PATH").unwrap_or(media_defaults.ffprobe_path);
        let staging_dir = std::env::var("STAGING_DIR")
            .ok()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .unwrap_or(media_defaults.staging_dir);

        let max_thumbnail_size = std::env::var("MAX_THUMBNAIL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 << 20); // 10MB

        let max_video_size = std::env::var("MAX_VIDEO_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1 << 30); // 1GB

        let config = Config {
            server: ServerConfig {
                bind_address,
                public_base_url,
                data_dir,
            },
            auth: AuthConfig { jwt_secret },
            storage: StorageConfig {
                backend: storage_backend,
                assets_root,
                local_storage_path,
                s3_bucket,
                s3_region,
                s3_endpoint,
                signed_url_ttl,
            },
            media: MediaConfig {
                ffmpeg_path,
                ffprobe_path,
                staging_dir,
            },
            max_thumbnail_size,
            max_video_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "JWT_SECRET must be set".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::S3 && self.storage.s3_bucket.is_none() {
            return Err(ConfigError::ValidationError(
                "S3_BUCKET is required when STORAGE_BACKEND=s3".to_string(),
            ));
        }

        if self.storage.signed_url_ttl.is_zero() {
            return Err(ConfigError::ValidationError(
                "SIGNED_URL_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.max_thumbnail_size == 0 || self.max_video_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload size limits must be greater than 0".to_string(),
            ));
        }

        if self.auth.jwt_secret.len() < 32 {
            tracing::warn!(
                "JWT_SECRET is shorter than 32 bytes. Consider using a longer random secret."
            );
        }

        Ok(())
    }
}

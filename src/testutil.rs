//! Shared test helpers for tubely handler tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use crate::auth::{Claims, ACCESS_TOKEN_ISSUER};
use crate::config::{AuthConfig, Config, MediaConfig, ServerConfig, StorageConfig};
use crate::object_store::LocalStore;
use crate::processing::{processing_path, Dimensions, MediaToolError, MediaTools};
use crate::storage::Database;
use crate::AppState;

pub const TEST_JWT_SECRET: &str = "tubely-test-secret-0123456789abcdef";
pub const TEST_BASE_URL: &str = "http://localhost:8091";
pub const BOUNDARY: &str = "tubely-test-boundary";

/// Stand-in for ffmpeg/ffprobe: reports fixed dimensions and "rewrites" by copying.
pub struct FakeMediaTools {
    dimensions: Option<Dimensions>,
    calls: AtomicUsize,
}

impl FakeMediaTools {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dimensions: Some(Dimensions { width, height }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Tools whose dimension lookup always fails.
    pub fn failing() -> Self {
        Self {
            dimensions: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTools for FakeMediaTools {
    async fn probe_dimensions(&self, path: &Path) -> Result<Dimensions, MediaToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "dimensions read from a missing file");
        self.dimensions
            .ok_or_else(|| MediaToolError::InvalidOutput("no video stream found".to_string()))
    }

    async fn faststart(&self, path: &Path) -> Result<PathBuf, MediaToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = processing_path(path);
        tokio::fs::copy(path, &output)
            .await
            .map_err(|e| MediaToolError::InvalidOutput(e.to_string()))?;
        Ok(output)
    }
}

pub fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    let root = temp_dir.path();
    Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            public_base_url: TEST_BASE_URL.to_string(),
            data_dir: root.join("data").to_string_lossy().to_string(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
        },
        storage: StorageConfig {
            assets_root: root.join("assets").to_string_lossy().to_string(),
            local_storage_path: root.join("media").to_string_lossy().to_string(),
            ..Default::default()
        },
        media: MediaConfig {
            staging_dir: root.join("staging"),
            ..Default::default()
        },
        max_thumbnail_size: 1024 * 1024,
        max_video_size: 10 * 1024 * 1024,
    }
}

/// Create a test AppState with a temporary database and local object stores.
pub fn test_state_with(config: Config, media_tools: Arc<FakeMediaTools>) -> Arc<AppState> {
    let db = Database::open(&config.server.data_dir).expect("Failed to open test database");
    let assets = LocalStore::new(
        &config.storage.assets_root,
        "assets",
        format!("{TEST_BASE_URL}/assets"),
    )
    .expect("Failed to create test assets store");
    let media = LocalStore::new(
        &config.storage.local_storage_path,
        "local",
        format!("{TEST_BASE_URL}/media"),
    )
    .expect("Failed to create test media store");

    Arc::new(AppState {
        config,
        db: Arc::new(db),
        assets: Arc::new(assets),
        object_store: Arc::new(media),
        media_tools,
    })
}

pub fn test_state(temp_dir: &tempfile::TempDir, media_tools: Arc<FakeMediaTools>) -> Arc<AppState> {
    test_state_with(test_config(temp_dir), media_tools)
}

/// Sign an access token for `user_id` with the test secret.
pub fn token_for(user_id: Uuid) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: ACCESS_TOKEN_ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// A multipart/form-data body with one file part, delimited by `BOUNDARY`.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Number of entries directly inside `dir`; 0 when it does not exist.
pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Number of regular files under `dir`, recursively.
pub fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

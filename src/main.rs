use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubely::{
    api,
    config::{Config, StorageBackend},
    object_store as obj,
    processing::Ffmpeg,
    storage::Database,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "tubely starting");

    let config = Config::load()?;

    let db = Database::open(&config.server.data_dir)?;
    info!(data_dir = %config.server.data_dir, "Database opened");

    // Thumbnails always live on local disk, served under /assets
    let assets = obj::LocalStore::new(
        &config.storage.assets_root,
        "assets",
        format!("{}{}", config.server.public_base_url, api::ASSETS_MOUNT),
    )?;
    info!(assets_root = %config.storage.assets_root, "Serving thumbnails");

    let object_store = video_store(&config).await?;
    let media_tools = Ffmpeg::new(&config.media.ffmpeg_path, &config.media.ffprobe_path);

    let state = Arc::new(AppState {
        config: config.clone(),
        db: Arc::new(db),
        assets: Arc::new(assets),
        object_store,
        media_tools: Arc::new(media_tools),
    });

    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    info!(
        bind_address = %config.server.bind_address,
        public_base_url = %config.server.public_base_url,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// LOG_FORMAT selects the output: `gcp` (Stackdriver), `json`, or plain text.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    match std::env::var("LOG_FORMAT")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "gcp" => registry.with(tracing_stackdriver::layer()).init(),
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_list(false),
            )
            .init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Build the store uploaded videos are written to.
async fn video_store(config: &Config) -> anyhow::Result<Arc<dyn obj::ObjectStore>> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Local => {
            let store = obj::LocalStore::new(
                &storage.local_storage_path,
                "local",
                format!("{}{}", config.server.public_base_url, api::MEDIA_MOUNT),
            )?;
            info!(path = %storage.local_storage_path, "Using local video storage");
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let bucket = storage
                .s3_bucket
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("S3_BUCKET is required when STORAGE_BACKEND=s3"))?;
            let store =
                obj::S3Store::new(bucket, &storage.s3_region, storage.s3_endpoint.as_deref()).await;
            info!(bucket, region = %storage.s3_region, "Using S3 video storage");
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

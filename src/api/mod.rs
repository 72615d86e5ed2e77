pub mod handlers;
pub mod response;
mod routes;

pub use routes::create_router;

/// URL path thumbnails are served under
pub const ASSETS_MOUNT: &str = "/assets";
/// URL path the local video backend is served under
pub const MEDIA_MOUNT: &str = "/media";

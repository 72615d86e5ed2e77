pub mod db;
pub mod models;
mod tables;
mod videos;

pub use db::{Database, DatabaseError};
pub use tables::*;

use uuid::Uuid;

use crate::object_store::ObjectLocation;
use models::{Replaced, VideoRecord};

/// Persistence for video metadata.
pub trait VideoRepository: Send + Sync {
    fn create_video(&self, video: &VideoRecord) -> Result<(), DatabaseError>;
    fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, DatabaseError>;
    /// Point the record at a new thumbnail, reading and writing in one
    /// transaction. `None` if the record does not exist.
    fn set_thumbnail(
        &self,
        id: Uuid,
        url: String,
        location: ObjectLocation,
    ) -> Result<Option<Replaced>, DatabaseError>;
    /// Point the record at a new video object, reading and writing in one
    /// transaction. `None` if the record does not exist.
    fn set_video_location(
        &self,
        id: Uuid,
        location: ObjectLocation,
    ) -> Result<Option<Replaced>, DatabaseError>;
    fn delete_video(&self, id: Uuid) -> Result<bool, DatabaseError>;
    fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, DatabaseError>;
}

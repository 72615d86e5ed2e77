use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::object_store::{deserialize_stored_location, ObjectLocation};

/// A video record stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: Uuid,
    /// Only this user may modify the record.
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Where the thumbnail behind `thumbnail_url` is stored
    #[serde(default)]
    pub thumbnail_location: Option<ObjectLocation>,
    #[serde(default, deserialize_with = "deserialize_stored_location")]
    pub video_location: Option<ObjectLocation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(user_id: Uuid, title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description,
            thumbnail_url: None,
            thumbnail_location: None,
            video_location: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// A record after a single-field update, with the location it replaced.
#[derive(Debug)]
pub struct Replaced {
    pub video: VideoRecord,
    pub previous: Option<ObjectLocation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shape of records written before locations were structured.
    #[derive(Serialize)]
    struct LegacyRecord {
        id: Uuid,
        user_id: Uuid,
        title: String,
        video_location: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    fn legacy(video_location: Option<&str>) -> Vec<u8> {
        let now = Utc::now();
        rmp_serde::to_vec_named(&LegacyRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Old upload".to_string(),
            video_location: video_location.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
        .unwrap()
    }

    #[test]
    fn decodes_legacy_location_string() {
        let record: VideoRecord =
            rmp_serde::from_slice(&legacy(Some("tubely-videos,portrait/abc.mp4"))).unwrap();
        assert_eq!(
            record.video_location,
            Some(ObjectLocation::new("tubely-videos", "portrait/abc.mp4"))
        );
        assert!(record.thumbnail_location.is_none());
    }

    #[test]
    fn decodes_missing_location() {
        let record: VideoRecord = rmp_serde::from_slice(&legacy(None)).unwrap();
        assert!(record.video_location.is_none());
    }

    #[test]
    fn rejects_malformed_legacy_location() {
        let result = rmp_serde::from_slice::<VideoRecord>(&legacy(Some("no-comma-here")));
        assert!(result.is_err());
    }

    #[test]
    fn structured_location_round_trips() {
        let mut record = VideoRecord::new(Uuid::new_v4(), "New upload", None);
        record.video_location = Some(ObjectLocation::new("local", "landscape/xyz.mp4"));

        let bytes = rmp_serde::to_vec_named(&record).unwrap();
        let decoded: VideoRecord = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded, record);
    }
}

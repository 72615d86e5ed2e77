use chrono::Utc;
use redb::{ReadableTable, WriteTransaction};
use uuid::Uuid;

use super::db::{Database, DatabaseError};
use super::models::{Replaced, VideoRecord};
use crate::object_store::ObjectLocation;
use super::tables::*;
use super::VideoRepository;

impl Database {
    fn read_video(
        write_txn: &WriteTransaction,
        id: &str,
    ) -> Result<Option<VideoRecord>, DatabaseError> {
        let table = write_txn.open_table(VIDEOS)?;
        let result = match table.get(id)? {
            Some(data) => Some(rmp_serde::from_slice(data.value())?),
            None => None,
        };
        Ok(result)
    }

    fn owner_index(write_txn: &WriteTransaction, user_id: &str) -> Result<Vec<String>, DatabaseError> {
        let table = write_txn.open_table(USER_VIDEOS)?;
        let result = match table.get(user_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => Vec::new(),
        };
        Ok(result)
    }

    fn index_add(
        write_txn: &WriteTransaction,
        user_id: &str,
        video_id: &str,
    ) -> Result<(), DatabaseError> {
        let mut ids = Self::owner_index(write_txn, user_id)?;
        if !ids.iter().any(|id| id == video_id) {
            ids.push(video_id.to_string());
            let data = rmp_serde::to_vec_named(&ids)?;
            let mut table = write_txn.open_table(USER_VIDEOS)?;
            table.insert(user_id, data.as_slice())?;
        }
        Ok(())
    }

    fn index_remove(
        write_txn: &WriteTransaction,
        user_id: &str,
        video_id: &str,
    ) -> Result<(), DatabaseError> {
        let mut ids = Self::owner_index(write_txn, user_id)?;
        ids.retain(|id| id != video_id);

        let mut table = write_txn.open_table(USER_VIDEOS)?;
        if ids.is_empty() {
            table.remove(user_id)?;
        } else {
            let data = rmp_serde::to_vec_named(&ids)?;
            table.insert(user_id, data.as_slice())?;
        }
        Ok(())
    }

    /// Read-modify-write of one record inside a single write transaction, so
    /// concurrent updates to other fields are never overwritten.
    fn modify_video(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut VideoRecord) -> Option<ObjectLocation>,
    ) -> Result<Option<Replaced>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let replaced = match Self::read_video(&write_txn, &id.to_string())? {
            Some(mut video) => {
                let previous = apply(&mut video);
                video.updated_at = Utc::now();
                Self::write_video(&write_txn, &video)?;
                Some(Replaced { video, previous })
            }
            None => None,
        };

        write_txn.commit()?;
        Ok(replaced)
    }

    fn write_video(write_txn: &WriteTransaction, video: &VideoRecord) -> Result<(), DatabaseError> {
        let data = rmp_serde::to_vec_named(video)?;
        let mut table = write_txn.open_table(VIDEOS)?;
        table.insert(video.id.to_string().as_str(), data.as_slice())?;
        Ok(())
    }
}

impl VideoRepository for Database {
    /// Store a new record and add it to its owner's index
    fn create_video(&self, video: &VideoRecord) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        Self::write_video(&write_txn, video)?;
        Self::index_add(
            &write_txn,
            &video.user_id.to_string(),
            &video.id.to_string(),
        )?;
        write_txn.commit()?;
        Ok(())
    }

    fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(VIDEOS)?;

        match table.get(id.to_string().as_str())? {
            Some(data) => {
                let video: VideoRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(video))
            }
            None => Ok(None),
        }
    }

    fn set_thumbnail(
        &self,
        id: Uuid,
        url: String,
        location: ObjectLocation,
    ) -> Result<Option<Replaced>, DatabaseError> {
        self.modify_video(id, |video| {
            video.thumbnail_url = Some(url);
            video.thumbnail_location.replace(location)
        })
    }

    fn set_video_location(
        &self,
        id: Uuid,
        location: ObjectLocation,
    ) -> Result<Option<Replaced>, DatabaseError> {
        self.modify_video(id, |video| video.video_location.replace(location))
    }

    /// Delete a record and drop it from its owner's index
    fn delete_video(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let id = id.to_string();
        let write_txn = self.begin_write()?;

        let deleted = match Self::read_video(&write_txn, &id)? {
            Some(existing) => {
                {
                    let mut table = write_txn.open_table(VIDEOS)?;
                    table.remove(id.as_str())?;
                }
                Self::index_remove(&write_txn, &existing.user_id.to_string(), &id)?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// All of a user's videos, newest first
    fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(USER_VIDEOS)?;
        let videos_table = read_txn.open_table(VIDEOS)?;

        let video_ids: Vec<String> = match index.get(user_id.to_string().as_str())? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut videos = Vec::with_capacity(video_ids.len());
        for video_id in video_ids {
            if let Some(data) = videos_table.get(video_id.as_str())? {
                let video: VideoRecord = rmp_serde::from_slice(data.value())?;
                videos.push(video);
            }
        }

        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }
}

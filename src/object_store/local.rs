use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use super::{ObjectLocation, ObjectStore, ObjectStoreError};

/// Local filesystem object store. Objects are served back over HTTP by the
/// router, so retrieval URLs are plain links under `url_prefix`.
pub struct LocalStore {
    base_path: PathBuf,
    bucket: String,
    url_prefix: String,
}

impl LocalStore {
    /// `url_prefix` is the public URL the base directory is mounted at,
    /// e.g. `http://localhost:8091/assets`.
    pub fn new<P: AsRef<Path>>(
        base_path: P,
        bucket: impl Into<String>,
        url_prefix: impl Into<String>,
    ) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            bucket: bucket.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(ObjectStoreError::InvalidLocation(format!(
                "key escapes store root: {key}"
            )));
        }
        Ok(self.base_path.join(relative))
    }

    async fn ensure_parent(path: &Path) -> Result<(), ObjectStoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        Self::ensure_parent(&path).await?;
        tokio::fs::write(&path, &data).await?;
        Ok(())
    }

    async fn put_file(
        &self,
        key: &str,
        source: &Path,
        _content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        Self::ensure_parent(&path).await?;
        tokio::fs::copy(source, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn retrieval_url(
        &self,
        location: &ObjectLocation,
        _ttl: Duration,
    ) -> Result<String, ObjectStoreError> {
        if location.bucket != self.bucket {
            return Err(ObjectStoreError::InvalidLocation(format!(
                "object in bucket '{}' is not served by local store '{}'",
                location.bucket, self.bucket
            )));
        }
        Ok(format!("{}/{}", self.url_prefix, location.key))
    }
}

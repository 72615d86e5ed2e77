mod local;
mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid object location: {0}")]
    InvalidLocation(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Failed to generate object key")]
    KeyGeneration,
}

/// Where an uploaded object lives: bucket plus key within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse the legacy `bucket,key` encoding.
    pub fn parse(encoded: &str) -> Result<Self, ObjectStoreError> {
        let parts: Vec<&str> = encoded.split(',').collect();
        match parts.as_slice() {
            [bucket, key] if !bucket.is_empty() && !key.is_empty() => Ok(Self::new(*bucket, *key)),
            _ => Err(ObjectStoreError::InvalidLocation(format!(
                "expected 'bucket,key', got {} part(s)",
                parts.len()
            ))),
        }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

/// Deserialize an optional stored location, accepting records written with
/// the legacy `bucket,key` string as well as the structured form.
pub fn deserialize_stored_location<'de, D>(
    deserializer: D,
) -> Result<Option<ObjectLocation>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Structured(ObjectLocation),
        Legacy(String),
    }

    match Option::<Stored>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Stored::Structured(location)) => Ok(Some(location)),
        Some(Stored::Legacy(encoded)) => ObjectLocation::parse(&encoded)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Build `<prefix>/<random>.<extension>` from 32 bytes of system randomness,
/// URL-safe base64 encoded.
pub fn generate_object_key(prefix: &str, extension: &str) -> Result<String, ObjectStoreError> {
    let mut raw = [0u8; 32];
    SystemRandom::new()
        .fill(&mut raw)
        .map_err(|_| ObjectStoreError::KeyGeneration)?;
    let random = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw);

    Ok(if prefix.is_empty() {
        format!("{random}.{extension}")
    } else {
        format!("{prefix}/{random}.{extension}")
    })
}

/// Abstraction over object storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket (or bucket-equivalent) objects are written to.
    fn bucket(&self) -> &str;

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), ObjectStoreError>;

    /// Upload the contents of a local file without buffering it in memory.
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), ObjectStoreError>;

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;

    /// URL a client can read the object from, valid for at least `ttl`.
    async fn retrieval_url(
        &self,
        location: &ObjectLocation,
        ttl: Duration,
    ) -> Result<String, ObjectStoreError>;

    /// Location of `key` within this store.
    fn location(&self, key: &str) -> ObjectLocation {
        ObjectLocation::new(self.bucket(), key)
    }
}

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{ObjectLocation, ObjectStore, ObjectStoreError};

/// S3 (or S3-compatible) object store backend.
pub struct S3Store {
    bucket: String,
    client: Client,
}

impl S3Store {
    /// Build a client from the default AWS credential chain. `endpoint` points
    /// the client at an S3-compatible provider and switches to path-style
    /// addressing.
    pub async fn new(bucket: &str, region: &str, endpoint: Option<&str>) -> Self {
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            bucket: bucket.to_string(),
            client: Client::from_conf(builder.build()),
        }
    }

    async fn put_body(
        &self,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                ObjectStoreError::Backend(format!("S3 upload failed: {}", e.into_service_error()))
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_millis() as u64,
            "S3 upload successful"
        );
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), ObjectStoreError> {
        self.put_body(key, ByteStream::from(data), content_type)
            .await
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| ObjectStoreError::Backend(format!("Failed to open {}: {e}", path.display())))?;
        self.put_body(key, body, content_type).await
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        // S3 treats deleting a missing key as success
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                ObjectStoreError::Backend(format!("S3 delete failed: {}", e.into_service_error()))
            })?;
        Ok(())
    }

    async fn retrieval_url(
        &self,
        location: &ObjectLocation,
        ttl: Duration,
    ) -> Result<String, ObjectStoreError> {
        let presigning_config = PresigningConfig::expires_in(ttl)
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .presigned(presigning_config)
            .await
            .map_err(|e| ObjectStoreError::Backend(format!("S3 presign failed: {e}")))?;

        Ok(presigned.uri().to_string())
    }
}

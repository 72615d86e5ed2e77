//! Scratch-file staging for uploads that need to be handed to external tools.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Name prefix of every per-upload scratch directory.
pub const STAGING_PREFIX: &str = "tubely-upload";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read upload: {0}")]
    Read(#[from] MultipartError),
    #[error("Upload exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// An upload written to a private scratch directory.
///
/// The directory and everything created inside it (including tool output
/// written next to the staged file) is removed when this value is dropped.
pub struct StagedUpload {
    _dir: TempDir,
    path: PathBuf,
    byte_size: u64,
}

impl StagedUpload {
    /// Create an empty scratch directory under `root` for a file named
    /// `upload.<extension>`.
    pub fn new(root: &Path, extension: &str) -> Result<Self, StagingError> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(root)?;
        let path = dir.path().join(format!("upload.{extension}"));
        Ok(Self {
            _dir: dir,
            path,
            byte_size: 0,
        })
    }

    /// Stream a multipart field to disk chunk by chunk, failing once more than
    /// `max_bytes` have been received.
    pub async fn from_field(
        mut field: Field<'_>,
        root: &Path,
        extension: &str,
        max_bytes: u64,
    ) -> Result<Self, StagingError> {
        let mut staged = Self::new(root, extension)?;
        let mut file = tokio::fs::File::create(&staged.path).await?;

        while let Some(chunk) = field.chunk().await? {
            staged.byte_size += chunk.len() as u64;
            if staged.byte_size > max_bytes {
                return Err(StagingError::TooLarge { limit: max_bytes });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_dir_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let staged = StagedUpload::new(root.path(), "mp4").unwrap();
        let dir = staged.path().parent().unwrap().to_path_buf();
        assert!(dir.starts_with(root.path()));
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(STAGING_PREFIX));
        assert_eq!(staged.path().file_name().unwrap(), "upload.mp4");

        // Tool output written beside the staged file goes away too
        std::fs::write(staged.path(), b"video").unwrap();
        std::fs::write(dir.join("upload.mp4.processing"), b"processed").unwrap();

        drop(staged);
        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_root_is_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("staging").join("videos");
        let staged = StagedUpload::new(&nested, "avi").unwrap();
        assert!(staged.path().starts_with(&nested));
    }
}

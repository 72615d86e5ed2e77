mod ffmpeg;

pub use ffmpeg::Ffmpeg;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaToolError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Invalid probe output: {0}")]
    InvalidOutput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// External media tooling a video upload depends on.
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Read the width and height of the file's video stream.
    async fn probe_dimensions(&self, path: &Path) -> Result<Dimensions, MediaToolError>;
    /// Rewrite the file with its index moved to the front for progressive playback.
    /// Returns the path of the rewritten copy.
    async fn faststart(&self, path: &Path) -> Result<PathBuf, MediaToolError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Parse `ffprobe -print_format json -show_streams` output.
/// Audio streams carry no dimensions and are skipped.
pub fn parse_probe_output(stdout: &[u8]) -> Result<Dimensions, MediaToolError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MediaToolError::InvalidOutput(e.to_string()))?;

    output
        .streams
        .iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(width), Some(height)) => Some(Dimensions { width, height }),
            _ => None,
        })
        .ok_or_else(|| MediaToolError::InvalidOutput("no video stream found".to_string()))
}

/// Output path for the faststart copy of `path`.
pub fn processing_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".processing");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_video_stream() {
        let out = br#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "sample_rate": "48000"},
                {"index": 1, "codec_type": "video", "width": 1920, "height": 1080}
            ]
        }"#;
        let dims = parse_probe_output(out).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn rejects_output_without_video_stream() {
        let out = br#"{"streams": [{"codec_type": "audio"}]}"#;
        assert!(matches!(
            parse_probe_output(out),
            Err(MediaToolError::InvalidOutput(_))
        ));

        assert!(matches!(
            parse_probe_output(b"{}"),
            Err(MediaToolError::InvalidOutput(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(MediaToolError::InvalidOutput(_))
        ));
    }

    #[test]
    fn processing_path_appends_suffix() {
        assert_eq!(
            processing_path(Path::new("/tmp/x/upload.mp4")),
            PathBuf::from("/tmp/x/upload.mp4.processing")
        );
    }
}

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use super::{parse_probe_output, processing_path, Dimensions, MediaTools, MediaToolError};

/// `MediaTools` backed by the ffmpeg and ffprobe executables.
pub struct Ffmpeg {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl Ffmpeg {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    async fn run(&self, program: &str, command: &mut Command) -> Result<Output, MediaToolError> {
        let output = command
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MediaToolError::Spawn {
                tool: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(MediaToolError::Failed {
                tool: program.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaTools for Ffmpeg {
    async fn probe_dimensions(&self, path: &Path) -> Result<Dimensions, MediaToolError> {
        let start = std::time::Instant::now();
        let output = self
            .run(
                &self.ffprobe_path,
                Command::new(&self.ffprobe_path)
                    .args(["-v", "error", "-print_format", "json", "-show_streams"])
                    .arg(path),
            )
            .await?;

        let dimensions = parse_probe_output(&output.stdout)?;
        tracing::debug!(
            path = %path.display(),
            width = dimensions.width,
            height = dimensions.height,
            duration_ms = start.elapsed().as_millis() as u64,
            "Probed video dimensions"
        );
        Ok(dimensions)
    }

    async fn faststart(&self, path: &Path) -> Result<PathBuf, MediaToolError> {
        let start = std::time::Instant::now();
        let output_path = processing_path(path);

        self.run(
            &self.ffmpeg_path,
            Command::new(&self.ffmpeg_path)
                .arg("-i")
                .arg(path)
                .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
                .arg(&output_path),
        )
        .await?;

        tracing::debug!(
            path = %output_path.display(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Rewrote video for faststart"
        );
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let tools = Ffmpeg::new(
            "/nonexistent/tubely-ffmpeg",
            "/nonexistent/tubely-ffprobe",
        );

        let err = tools
            .probe_dimensions(Path::new("/tmp/whatever.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaToolError::Spawn { .. }));

        let err = tools
            .faststart(Path::new("/tmp/whatever.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaToolError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        // `false` ignores its arguments and exits 1
        let tools = Ffmpeg::new("false", "false");
        let err = tools
            .probe_dimensions(Path::new("/tmp/whatever.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaToolError::Failed { .. }));
    }
}

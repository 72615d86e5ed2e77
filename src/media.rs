//! Upload classification: allow-listed file formats and coarse aspect ratios.
//!
//! Formats are derived from the uploaded filename's extension only. The
//! payload itself is never inspected.

const ASPECT_EPSILON: f64 = 0.01;

/// Coarse bucketing of a video's width/height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    pub fn classify(width: u32, height: u32) -> Self {
        if height == 0 {
            return AspectRatio::Other;
        }

        let ratio = f64::from(width) / f64::from(height);
        if (ratio - 16.0 / 9.0).abs() < ASPECT_EPSILON {
            AspectRatio::Landscape
        } else if (ratio - 9.0 / 16.0).abs() < ASPECT_EPSILON {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    /// Ratio label as reported to clients ("16/9", "9/16", "other").
    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16/9",
            AspectRatio::Portrait => "9/16",
            AspectRatio::Other => "other",
        }
    }

    /// Object-store key prefix for videos of this ratio.
    pub fn key_prefix(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

/// Extension of a filename: the text after the last `.`.
pub fn file_extension(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    Png,
    Jpg,
}

impl ThumbnailFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        match file_extension(filename)?.to_ascii_lowercase().as_str() {
            "png" => Some(ThumbnailFormat::Png),
            "jpg" => Some(ThumbnailFormat::Jpg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ThumbnailFormat::Png => "png",
            ThumbnailFormat::Jpg => "jpg",
        }
    }

    pub fn mime_type(self) -> String {
        guess_mime(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    Mp4,
    Avi,
}

impl VideoFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        match file_extension(filename)?.to_ascii_lowercase().as_str() {
            "mp4" => Some(VideoFormat::Mp4),
            "avi" => Some(VideoFormat::Avi),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Avi => "avi",
        }
    }
}

fn guess_mime(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_resolutions() {
        assert_eq!(AspectRatio::classify(1920, 1080), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(1280, 720), AspectRatio::Landscape);
        assert_eq!(AspectRatio::classify(1080, 1920), AspectRatio::Portrait);
        assert_eq!(AspectRatio::classify(720, 1280), AspectRatio::Portrait);
        assert_eq!(AspectRatio::classify(800, 800), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(640, 480), AspectRatio::Other);
    }

    #[test]
    fn zero_height_is_other() {
        assert_eq!(AspectRatio::classify(1920, 0), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(0, 0), AspectRatio::Other);
    }

    #[test]
    fn classification_respects_epsilon() {
        // 1918/1080 = 1.7759, within 0.01 of 16/9 (1.7778)
        assert_eq!(AspectRatio::classify(1918, 1080), AspectRatio::Landscape);
        // 1940/1080 = 1.7963, outside the window
        assert_eq!(AspectRatio::classify(1940, 1080), AspectRatio::Other);
        // 620/1080 = 0.5741, outside 0.01 of 9/16 (0.5625)
        assert_eq!(AspectRatio::classify(620, 1080), AspectRatio::Other);
        assert_eq!(AspectRatio::classify(608, 1080), AspectRatio::Portrait);
    }

    #[test]
    fn classification_matches_ratio_window_exhaustively() {
        for height in [1u32, 9, 16, 90, 360, 1080] {
            for width in (0..=height * 3).step_by(7) {
                let ratio = f64::from(width) / f64::from(height);
                let expected = if (ratio - 16.0 / 9.0).abs() < 0.01 {
                    AspectRatio::Landscape
                } else if (ratio - 9.0 / 16.0).abs() < 0.01 {
                    AspectRatio::Portrait
                } else {
                    AspectRatio::Other
                };
                assert_eq!(AspectRatio::classify(width, height), expected, "{width}x{height}");
            }
        }
    }

    #[test]
    fn labels_and_prefixes() {
        assert_eq!(AspectRatio::Landscape.label(), "16/9");
        assert_eq!(AspectRatio::Portrait.label(), "9/16");
        assert_eq!(AspectRatio::Other.label(), "other");
        assert_eq!(AspectRatio::Landscape.key_prefix(), "landscape");
        assert_eq!(AspectRatio::Portrait.key_prefix(), "portrait");
        assert_eq!(AspectRatio::Other.key_prefix(), "other");
    }

    #[test]
    fn extension_parsing() {
        assert_eq!(file_extension("cover.png"), Some("png"));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz"));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn thumbnail_allow_list() {
        assert_eq!(ThumbnailFormat::from_filename("a.png"), Some(ThumbnailFormat::Png));
        assert_eq!(ThumbnailFormat::from_filename("a.JPG"), Some(ThumbnailFormat::Jpg));
        assert_eq!(ThumbnailFormat::from_filename("a.jpeg"), None);
        assert_eq!(ThumbnailFormat::from_filename("a.gif"), None);
        assert_eq!(ThumbnailFormat::from_filename("png"), None);
        assert_eq!(ThumbnailFormat::Png.mime_type(), "image/png");
        assert_eq!(ThumbnailFormat::Jpg.mime_type(), "image/jpeg");
    }

    #[test]
    fn video_allow_list() {
        assert_eq!(VideoFormat::from_filename("clip.mp4"), Some(VideoFormat::Mp4));
        assert_eq!(VideoFormat::from_filename("clip.avi"), Some(VideoFormat::Avi));
        assert_eq!(VideoFormat::from_filename("clip.mov"), None);
        assert_eq!(VideoFormat::from_filename("clip.mp4.exe"), None);
    }
}

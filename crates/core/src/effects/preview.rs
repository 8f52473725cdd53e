use serde::{Deserialize, Serialize};

/// Extensions rendered with a video player.
pub const VIDEO_PREVIEW_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi"];

/// Extensions rendered with an audio player.
pub const AUDIO_PREVIEW_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a"];

/// How a finished artifact is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    Image,
    Video,
    Audio,
}

impl PreviewKind {
    /// Pick the preview kind from the file's last extension. Unmatched names render as images.
    pub fn for_file(output_file: &str) -> Self {
        let ext = output_file
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if VIDEO_PREVIEW_EXTENSIONS.contains(&ext.as_str()) {
            PreviewKind::Video
        } else if AUDIO_PREVIEW_EXTENSIONS.contains(&ext.as_str()) {
            PreviewKind::Audio
        } else {
            PreviewKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewKind::Image => "image",
            PreviewKind::Video => "video",
            PreviewKind::Audio => "audio",
        }
    }
}

/// A preview handed to the presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub output_file: String,
    pub kind: PreviewKind,
    /// Where the converted artifact can be fetched for display.
    pub url: String,
}

impl Preview {
    pub fn new(output_file: &str, url: String) -> Self {
        Self {
            output_file: output_file.to_string(),
            kind: PreviewKind::for_file(output_file),
            url,
        }
    }
}

//! Format catalog - which output formats are offered for a selection.
//!
//! Only the first selected file's media type is consulted; files after it
//! never change the offered list.

use serde::{Deserialize, Serialize};

use crate::selection::Selection;

/// Output formats offered for video input.
pub const VIDEO_FORMATS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"];

/// Output formats offered for audio input.
pub const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a"];

/// Output formats offered for image input (and anything unrecognized).
pub const IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Broad class of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaClass {
    Video,
    Audio,
    Image,
}

impl MediaClass {
    /// Classify a MIME type by prefix. Anything not video or audio is treated as an image.
    pub fn from_media_type(media_type: &str) -> Self {
        if media_type.starts_with("video") {
            MediaClass::Video
        } else if media_type.starts_with("audio") {
            MediaClass::Audio
        } else {
            MediaClass::Image
        }
    }

    /// Ordered output formats for this class.
    pub fn formats(&self) -> &'static [&'static str] {
        match self {
            MediaClass::Video => VIDEO_FORMATS,
            MediaClass::Audio => AUDIO_FORMATS,
            MediaClass::Image => IMAGE_FORMATS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaClass::Video => "video",
            MediaClass::Audio => "audio",
            MediaClass::Image => "image",
        }
    }
}

/// Result of [`formats_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChoices {
    /// Nothing selected; rendered as a disabled placeholder and never submitted.
    NoSelection,
    /// Formats for the class of the first selected file.
    Formats {
        class: MediaClass,
        formats: &'static [&'static str],
    },
}

impl FormatChoices {
    /// Placeholder label shown when nothing is selected.
    pub const PLACEHOLDER: &'static str = "Select a file first";

    pub fn formats(&self) -> &'static [&'static str] {
        match self {
            FormatChoices::NoSelection => &[],
            FormatChoices::Formats { formats, .. } => formats,
        }
    }

    pub fn is_selectable(&self) -> bool {
        matches!(self, FormatChoices::Formats { .. })
    }

    /// Case-insensitive membership check.
    pub fn contains(&self, format: &str) -> bool {
        self.formats()
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }

    /// The format pre-selected in the choice list.
    pub fn default_format(&self) -> Option<&'static str> {
        self.formats().first().copied()
    }
}

/// Map a selection to the ordered list of valid target formats.
pub fn formats_for(selection: &Selection) -> FormatChoices {
    match selection.first() {
        None => FormatChoices::NoSelection,
        Some(first) => {
            let class = MediaClass::from_media_type(&first.media_type);
            FormatChoices::Formats {
                class,
                formats: class.formats(),
            }
        }
    }
}

use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

/// Container of the produced videos.
/// Also defines which codecs the streams are re-encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    #[default]
    Mp4,
    Mkv,
    Webm,
}

impl Extension {
    /// Return the extension with the leading dot.
    /// e.g. ".ext"
    pub fn with_dot(self) -> &'static str {
        match self {
            Extension::Mp4 => ".mp4",
            Extension::Mkv => ".mkv",
            Extension::Webm => ".webm",
        }
    }

    /// Return the extension without the leading dot.
    /// e.g. "ext"
    pub fn with_no_dot(self) -> &'static str {
        &self.with_dot()[1..]
    }

    pub fn video_codec(self) -> &'static str {
        match self {
            Extension::Mp4 | Extension::Mkv => "libx264",
            Extension::Webm => "libvpx-vp9",
        }
    }

    pub fn audio_codec(self) -> &'static str {
        match self {
            Extension::Mp4 | Extension::Mkv => "aac",
            Extension::Webm => "libopus",
        }
    }

    /// Parse the path file extension.
    /// Return None in case of no or invalid extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext {
                "mp4" => Some(Self::Mp4),
                "mkv" => Some(Self::Mkv),
                "webm" => Some(Self::Webm),
                _ => None,
            })
    }
}

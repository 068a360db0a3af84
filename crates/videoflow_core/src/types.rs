use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// FileHandle
// ---------------------------------------------------------------------------

/// A file yielded by the selection surface. The bytes stay on disk; the
/// handle only carries what intake and export need to know about them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileHandle {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub mime: String,
}

impl FileHandle {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
        mime: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            size,
            mime: mime.into(),
        }
    }

    /// The MIME subtype, e.g. `mp4` for `video/mp4`.
    pub fn mime_subtype(&self) -> Option<&str> {
        self.mime
            .split_once('/')
            .map(|(_, sub)| sub)
            .filter(|sub| !sub.is_empty())
    }
}

// ---------------------------------------------------------------------------
// VideoMetadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoMetadata {
    /// Seconds.
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Bytes.
    pub size: u64,
    /// Upper-cased container name taken from the MIME subtype.
    pub format: String,
}

impl VideoMetadata {
    /// Build metadata for `file` from probed stream values. Negative or
    /// non-finite durations collapse to zero.
    pub fn from_probe(file: &FileHandle, duration: f64, width: u32, height: u32) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        Self {
            duration,
            width,
            height,
            size: file.size,
            format: format_from_mime(&file.mime),
        }
    }
}

/// `video/mp4` -> `MP4`. Anything without a subtype yields an empty string.
pub fn format_from_mime(mime: &str) -> String {
    mime.split_once('/')
        .map(|(_, sub)| sub.to_uppercase())
        .unwrap_or_default()
}

/// The file currently loaded into a session together with its metadata.
/// Keeping both in one value means one can never be present without the
/// other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadedVideo {
    pub file: FileHandle,
    pub metadata: VideoMetadata,
}

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Effect {
    FadeIn,
    Blur,
    Sepia,
    BlackAndWhite,
}

impl Effect {
    pub const ALL: [Effect; 4] = [
        Effect::FadeIn,
        Effect::Blur,
        Effect::Sepia,
        Effect::BlackAndWhite,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Effect::FadeIn => "Fade In",
            Effect::Blur => "Blur",
            Effect::Sepia => "Sepia",
            Effect::BlackAndWhite => "B&W",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Effect {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '&')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "fadein" | "fade" => Ok(Effect::FadeIn),
            "blur" => Ok(Effect::Blur),
            "sepia" => Ok(Effect::Sepia),
            "b&w" | "bw" | "blackandwhite" | "grayscale" | "greyscale" => {
                Ok(Effect::BlackAndWhite)
            }
            _ => Err(CoreError::UnknownEffect(s.to_string())),
        }
    }
}

//! Display strings shared by the timeline, the control panel and the
//! preview clock.

use crate::types::VideoMetadata;

/// Shown in place of a metadata value when nothing is loaded.
pub const PLACEHOLDER: &str = "—";

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

/// `65.0` -> `1:05`. Minutes are not padded and are not wrapped into hours.
pub fn clock(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{}:{:02}", total / 60, total % 60)
}

/// `65.0` -> `01:05`, the ruler style.
pub fn ruler_label(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Bytes as MiB with one decimal, `10485760` -> `10.0 MB`.
pub fn size_mib(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

pub fn resolution(width: u32, height: u32) -> String {
    format!("{width}×{height}")
}

/// The four metadata strings the control panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDisplay {
    pub resolution: String,
    pub duration: String,
    pub format: String,
    pub size: String,
}

impl MetadataDisplay {
    pub fn from_metadata(metadata: Option<&VideoMetadata>) -> Self {
        match metadata {
            Some(m) => Self {
                resolution: resolution(m.width, m.height),
                duration: clock(m.duration),
                format: m.format.clone(),
                size: size_mib(m.size),
            },
            None => Self {
                resolution: PLACEHOLDER.to_string(),
                duration: PLACEHOLDER.to_string(),
                format: PLACEHOLDER.to_string(),
                size: PLACEHOLDER.to_string(),
            },
        }
    }
}

use crate::format::{clock, ruler_label};
use crate::session::{clamp_time, EditSession};

pub const RULER_LABELS: usize = 6;
pub const AUDIO_BARS: usize = 40;
pub const TOOL_BUTTONS: [&str; 3] = ["Cut", "Audio", "Effects"];
pub const ZOOM_LABEL: &str = "Zoom: 100%";

const UNKNOWN_LABEL: &str = "--:--";

/// Everything the timeline draws, derived from duration and current time.
/// The timeline owns no state of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineView {
    pub duration: f64,
    pub current_time: f64,
    pub ruler: Vec<String>,
    /// Playhead position and progress fill, as a fraction of track width.
    pub playhead: f64,
    /// Decorative bar heights for the audio lane, in pixels.
    pub audio_bars: Vec<f32>,
    pub duration_label: String,
}

impl TimelineView {
    pub fn new(duration: f64, current_time: f64) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        Self {
            duration,
            current_time,
            ruler: ruler(duration),
            playhead: playhead_fraction(current_time, duration),
            audio_bars: synthetic_audio_bars(AUDIO_BARS),
            duration_label: if duration > 0.0 {
                format!("Duration: {}", clock(duration))
            } else {
                format!("Duration: {UNKNOWN_LABEL}")
            },
        }
    }

    pub fn from_session(session: &EditSession) -> Self {
        Self::new(session.duration(), session.current_time())
    }

    /// A click on the video lane at `x` pixels into a lane `width` pixels
    /// wide. Yields nothing while there is no duration to seek within.
    pub fn seek_from_click(&self, x: f64, width: f64) -> Option<f64> {
        seek_from_click(x, width, self.duration)
    }
}

/// Seek time for a click at `x` within `width`, clamped to `[0, duration]`.
pub fn seek_from_click(x: f64, width: f64, duration: f64) -> Option<f64> {
    if !(duration > 0.0) || !(width > 0.0) || x.is_nan() {
        return None;
    }
    Some(clamp_time((x / width) * duration, duration))
}

/// Six evenly spaced labels over `[0, duration]`; placeholders when the
/// duration is unknown.
pub fn ruler(duration: f64) -> Vec<String> {
    if duration > 0.0 {
        let step = duration / (RULER_LABELS - 1) as f64;
        (0..RULER_LABELS)
            .map(|i| ruler_label(step * i as f64))
            .collect()
    } else {
        std::iter::once("00:00".to_string())
            .chain(std::iter::repeat(UNKNOWN_LABEL.to_string()).take(RULER_LABELS - 2))
            .collect()
    }
}

pub fn playhead_fraction(current_time: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        (clamp_time(current_time, duration) / duration).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Bar heights in `[4, 16)` px. Purely decorative: the lane is not backed
/// by audio data, so a fixed pseudo-random sequence keeps redraws stable.
pub fn synthetic_audio_bars(count: usize) -> Vec<f32> {
    let mut state: u32 = 0x9E37_79B9;
    (0..count)
        .map(|_| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            4.0 + (state % 1200) as f32 / 100.0
        })
        .collect()
}

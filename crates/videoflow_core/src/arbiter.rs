//! Decides which of the two time sources owns the playhead.
//!
//! Playback reports positions as it runs; the timeline and the preview
//! slider request seeks. A seek puts the arbiter into `FollowSeek` and
//! playback reports are ignored until the surface confirms the seek landed.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TimeSource {
    #[default]
    FollowPlayback,
    FollowSeek { target: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arbitration {
    /// Write this time into the session.
    Accept(f64),
    /// Stale report; drop it.
    Ignore,
}

#[derive(Debug, Default)]
pub struct TimeArbiter {
    source: TimeSource,
}

impl TimeArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> TimeSource {
        self.source
    }

    /// A manual seek was requested. Returns the target to apply.
    pub fn request_seek(&mut self, target: f64) -> f64 {
        tracing::trace!(target, "Following manual seek");
        self.source = TimeSource::FollowSeek { target };
        target
    }

    /// The surface finished a seek and playback owns the playhead again.
    pub fn seek_completed(&mut self, position: f64) -> Arbitration {
        self.source = TimeSource::FollowPlayback;
        Arbitration::Accept(position)
    }

    /// A periodic position report from playback.
    pub fn time_update(&self, position: f64) -> Arbitration {
        match self.source {
            TimeSource::FollowPlayback => Arbitration::Accept(position),
            TimeSource::FollowSeek { .. } => Arbitration::Ignore,
        }
    }

    /// Drop any pending seek, e.g. when a new file is bound.
    pub fn reset(&mut self) {
        self.source = TimeSource::FollowPlayback;
    }
}

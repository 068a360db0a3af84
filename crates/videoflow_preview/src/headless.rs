use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::{PreviewError, Result};
use crate::style::PresentationStyle;
use crate::surface::{PlaybackEvent, PlaybackSurface};

/// A playback surface with no window. Time only moves when [`advance`] is
/// called, which makes it usable from tests and from terminal sessions
/// without a player installed.
///
/// [`advance`]: HeadlessSurface::advance
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    loaded: Option<PathBuf>,
    duration: f64,
    position: f64,
    playing: bool,
    style: PresentationStyle,
    events: VecDeque<PlaybackEvent>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration reported once a file is loaded.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn loaded(&self) -> Option<&Path> {
        self.loaded.as_deref()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn style(&self) -> &PresentationStyle {
        &self.style
    }

    /// Let `seconds` of playback elapse. Emits a time update, and `Ended`
    /// when the end is reached.
    pub fn advance(&mut self, seconds: f64) {
        if !self.playing || self.loaded.is_none() {
            return;
        }
        self.position = (self.position + seconds).min(self.duration);
        self.events.push_back(PlaybackEvent::TimeUpdate(self.position));
        if self.position >= self.duration {
            self.playing = false;
            self.events.push_back(PlaybackEvent::Ended);
        }
    }

    /// Queue an event as if the surface had raised it.
    pub fn push_event(&mut self, event: PlaybackEvent) {
        self.events.push_back(event);
    }
}

impl PlaybackSurface for HeadlessSurface {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.loaded = Some(path.to_path_buf());
        self.position = 0.0;
        self.playing = false;
        self.events.clear();
        self.events.push_back(PlaybackEvent::MetadataLoaded {
            duration: self.duration,
        });
        Ok(())
    }

    fn unload(&mut self) -> Result<()> {
        self.loaded = None;
        self.playing = false;
        self.position = 0.0;
        self.events.clear();
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.loaded.is_none() {
            return Err(PreviewError::NothingLoaded);
        }
        if self.position >= self.duration {
            self.position = 0.0;
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.playing = false;
        Ok(())
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        if self.loaded.is_none() {
            return Err(PreviewError::NothingLoaded);
        }
        self.position = seconds.clamp(0.0, self.duration.max(0.0));
        self.events.push_back(PlaybackEvent::Seeked(self.position));
        Ok(())
    }

    fn set_style(&mut self, style: &PresentationStyle) -> Result<()> {
        self.style = *style;
        Ok(())
    }

    fn poll_events(&mut self) -> Result<Vec<PlaybackEvent>> {
        Ok(self.events.drain(..).collect())
    }
}

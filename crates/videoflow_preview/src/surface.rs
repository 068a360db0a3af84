use std::path::Path;

use crate::error::Result;
use crate::style::PresentationStyle;

/// Notifications coming back from a playback surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    MetadataLoaded { duration: f64 },
    TimeUpdate(f64),
    Seeked(f64),
    Ended,
}

/// A media element the preview drives: load, play, pause, seek and apply
/// presentation filters. Events are collected with [`poll_events`].
///
/// [`poll_events`]: PlaybackSurface::poll_events
pub trait PlaybackSurface {
    fn load(&mut self, path: &Path) -> Result<()>;
    fn unload(&mut self) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek(&mut self, seconds: f64) -> Result<()>;
    fn set_style(&mut self, style: &PresentationStyle) -> Result<()>;
    fn poll_events(&mut self) -> Result<Vec<PlaybackEvent>>;
}

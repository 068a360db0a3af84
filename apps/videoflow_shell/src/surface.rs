use std::path::Path;
use videoflow_preview::error::Result;
use videoflow_preview::headless::HeadlessSurface;
#[cfg(unix)]
use videoflow_preview::mpv::MpvSurface;
use videoflow_preview::style::PresentationStyle;
use videoflow_preview::surface::{PlaybackEvent, PlaybackSurface};

/// The playback surface picked at startup.
pub enum Surface {
    Headless(HeadlessSurface),
    #[cfg(unix)]
    Mpv(MpvSurface),
}

impl Surface {
    pub fn name(&self) -> &'static str {
        match self {
            Surface::Headless(_) => "headless",
            #[cfg(unix)]
            Surface::Mpv(_) => "mpv",
        }
    }

    /// Headless time only moves when told to; a real player keeps its own
    /// clock.
    pub fn advance(&mut self, seconds: f64) {
        if let Surface::Headless(s) = self {
            s.advance(seconds);
        }
    }

    /// Headless surfaces report whatever duration they are given on load.
    pub fn expect_duration(&mut self, duration: f64) {
        if let Surface::Headless(s) = self {
            s.set_duration(duration);
        }
    }
}

macro_rules! delegate {
    ($self:ident, $s:ident => $call:expr) => {
        match $self {
            Surface::Headless($s) => $call,
            #[cfg(unix)]
            Surface::Mpv($s) => $call,
        }
    };
}

impl PlaybackSurface for Surface {
    fn load(&mut self, path: &Path) -> Result<()> {
        delegate!(self, s => s.load(path))
    }

    fn unload(&mut self) -> Result<()> {
        delegate!(self, s => s.unload())
    }

    fn play(&mut self) -> Result<()> {
        delegate!(self, s => s.play())
    }

    fn pause(&mut self) -> Result<()> {
        delegate!(self, s => s.pause())
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        delegate!(self, s => s.seek(seconds))
    }

    fn set_style(&mut self, style: &PresentationStyle) -> Result<()> {
        delegate!(self, s => s.set_style(style))
    }

    fn poll_events(&mut self) -> Result<Vec<PlaybackEvent>> {
        delegate!(self, s => s.poll_events())
    }
}

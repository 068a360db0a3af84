use videoflow_core::arbiter::{Arbitration, TimeArbiter};
use videoflow_core::format::clock;
use videoflow_core::session::{clamp_time, EditSession};

use crate::error::{PreviewError, Result};
use crate::lease::{SourceLease, SourceRegistry};
use crate::style::PresentationStyle;
use crate::surface::{PlaybackEvent, PlaybackSurface};

/// Shows the session's file on a playback surface and feeds playback time
/// back into the session.
pub struct PreviewRenderer<S> {
    surface: S,
    registry: SourceRegistry,
    lease: Option<SourceLease>,
    arbiter: TimeArbiter,
    is_playing: bool,
    surface_duration: Option<f64>,
    style: PresentationStyle,
}

impl<S: PlaybackSurface> PreviewRenderer<S> {
    pub fn new(surface: S, registry: SourceRegistry) -> Self {
        Self {
            surface,
            registry,
            lease: None,
            arbiter: TimeArbiter::new(),
            is_playing: false,
            surface_duration: None,
            style: PresentationStyle::default(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_bound(&self) -> bool {
        self.lease.is_some()
    }

    pub fn arbiter(&self) -> &TimeArbiter {
        &self.arbiter
    }

    pub fn style(&self) -> &PresentationStyle {
        &self.style
    }

    /// Duration as reported by the surface once it has loaded the media.
    pub fn surface_duration(&self) -> Option<f64> {
        self.surface_duration
    }

    /// Bring the surface in line with the session: bind a newly loaded file
    /// (releasing the previous lease) and apply the current effects.
    pub fn sync(&mut self, session: &EditSession) -> Result<()> {
        let wanted = session.file();
        let bound = self.lease.as_ref().map(|l| l.file_id());

        match wanted {
            Some(file) if Some(file.id) != bound => {
                // Release before acquiring so at most one lease is live.
                self.lease = None;
                self.is_playing = false;
                self.surface_duration = None;
                self.arbiter.reset();
                let lease = self.registry.acquire(file);
                tracing::info!(url = %lease.url(), name = %file.name, "Binding preview");
                self.surface.load(lease.path())?;
                self.lease = Some(lease);
            }
            None if bound.is_some() => self.unbind()?,
            _ => {}
        }

        let style = PresentationStyle::from_effects(session.active_effects());
        if style != self.style {
            tracing::debug!(filter = %style.css_filter(), "Preview style changed");
            self.surface.set_style(&style)?;
            self.style = style;
        }
        Ok(())
    }

    pub fn unbind(&mut self) -> Result<()> {
        if self.lease.take().is_some() {
            self.surface.unload()?;
        }
        self.is_playing = false;
        self.surface_duration = None;
        self.arbiter.reset();
        Ok(())
    }

    /// Play if paused, pause if playing. Returns the new playing state.
    pub fn toggle_play(&mut self) -> Result<bool> {
        if self.lease.is_none() {
            return Err(PreviewError::NothingLoaded);
        }
        if self.is_playing {
            self.surface.pause()?;
        } else {
            self.surface.play()?;
        }
        self.is_playing = !self.is_playing;
        Ok(self.is_playing)
    }

    /// Move playback to `t`, e.g. after a timeline click. The session takes
    /// the target immediately; playback reports are held off until the
    /// surface confirms the seek.
    pub fn seek_to(&mut self, session: &mut EditSession, t: f64) -> Result<()> {
        if self.lease.is_none() {
            return Err(PreviewError::NothingLoaded);
        }
        let target = clamp_time(t, session.duration());
        // A rejected seek leaves playback in charge of the playhead.
        self.surface.seek(target)?;
        self.arbiter.request_seek(target);
        session.set_current_time(target);
        Ok(())
    }

    /// The preview's own position slider.
    pub fn scrub(&mut self, session: &mut EditSession, t: f64) -> Result<()> {
        self.seek_to(session, t)
    }

    pub fn handle_event(&mut self, session: &mut EditSession, event: PlaybackEvent) {
        match event {
            PlaybackEvent::MetadataLoaded { duration } => {
                self.surface_duration = Some(duration);
            }
            PlaybackEvent::TimeUpdate(t) => {
                if let Arbitration::Accept(t) = self.arbiter.time_update(t) {
                    session.set_current_time(t);
                }
            }
            PlaybackEvent::Seeked(t) => {
                if let Arbitration::Accept(t) = self.arbiter.seek_completed(t) {
                    session.set_current_time(t);
                }
            }
            PlaybackEvent::Ended => {
                tracing::debug!("Playback reached the end");
                self.is_playing = false;
            }
        }
    }

    /// Drain surface events into the session. Returns how many were handled.
    pub fn pump(&mut self, session: &mut EditSession) -> Result<usize> {
        if self.lease.is_none() {
            return Ok(0);
        }
        let events = self.surface.poll_events()?;
        let n = events.len();
        for event in events {
            self.handle_event(session, event);
        }
        Ok(n)
    }

    /// `current / duration`, e.g. `0:12 / 1:05`.
    pub fn clock_label(&self, session: &EditSession) -> String {
        let duration = self.surface_duration.unwrap_or_else(|| session.duration());
        format!("{} / {}", clock(session.current_time()), clock(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessSurface;
    use videoflow_core::arbiter::TimeSource;
    use videoflow_core::types::{Effect, FileHandle, VideoMetadata};

    fn session(duration: f64) -> EditSession {
        let mut s = EditSession::new();
        load(&mut s, "clip.mp4", duration);
        s
    }

    fn load(s: &mut EditSession, name: &str, duration: f64) {
        let file = FileHandle::new(name, format!("/tmp/{name}"), 1024, "video/mp4");
        let meta = VideoMetadata::from_probe(&file, duration, 1920, 1080);
        s.set_video(file, meta);
    }

    /// Headless playback whose loads and seeks can be made to fail.
    #[derive(Default)]
    struct Unreliable {
        inner: HeadlessSurface,
        failing_loads: usize,
        failing_seeks: usize,
    }

    impl PlaybackSurface for Unreliable {
        fn load(&mut self, path: &std::path::Path) -> Result<()> {
            if self.failing_loads > 0 {
                self.failing_loads -= 1;
                return Err(PreviewError::MpvCommand("loading failed".into()));
            }
            self.inner.load(path)
        }

        fn unload(&mut self) -> Result<()> {
            self.inner.unload()
        }

        fn play(&mut self) -> Result<()> {
            self.inner.play()
        }

        fn pause(&mut self) -> Result<()> {
            self.inner.pause()
        }

        fn seek(&mut self, seconds: f64) -> Result<()> {
            if self.failing_seeks > 0 {
                self.failing_seeks -= 1;
                return Err(PreviewError::MpvCommand("seek failed".into()));
            }
            self.inner.seek(seconds)
        }

        fn set_style(&mut self, style: &PresentationStyle) -> Result<()> {
            self.inner.set_style(style)
        }

        fn poll_events(&mut self) -> Result<Vec<PlaybackEvent>> {
            self.inner.poll_events()
        }
    }

    fn renderer(duration: f64) -> (PreviewRenderer<HeadlessSurface>, SourceRegistry) {
        let registry = SourceRegistry::new();
        let r = PreviewRenderer::new(
            HeadlessSurface::new().with_duration(duration),
            registry.clone(),
        );
        (r, registry)
    }

    #[test]
    fn binds_loaded_file() {
        let mut s = session(10.0);
        let (mut r, registry) = renderer(10.0);
        r.sync(&s).unwrap();
        assert!(r.is_bound());
        assert_eq!(r.surface().loaded().unwrap().to_str(), Some("/tmp/clip.mp4"));
        assert_eq!(registry.live(), 1);

        r.pump(&mut s).unwrap();
        assert_eq!(r.surface_duration(), Some(10.0));
    }

    #[test]
    fn replacing_the_file_releases_the_old_lease() {
        let mut s = session(10.0);
        let (mut r, registry) = renderer(10.0);
        r.sync(&s).unwrap();
        r.toggle_play().unwrap();

        load(&mut s, "other.mp4", 20.0);
        r.sync(&s).unwrap();
        assert_eq!(registry.live(), 1);
        assert!(!r.is_playing());
        assert_eq!(r.surface().loaded().unwrap().to_str(), Some("/tmp/other.mp4"));

        // Re-syncing the same file does not reload.
        r.sync(&s).unwrap();
        assert_eq!(registry.live(), 1);

        drop(r);
        assert_eq!(registry.live(), 0);
    }

    #[test]
    fn playback_advances_session_time() {
        let mut s = session(10.0);
        let (mut r, _) = renderer(10.0);
        r.sync(&s).unwrap();
        assert!(r.toggle_play().unwrap());

        r.surface_mut().advance(2.5);
        r.pump(&mut s).unwrap();
        assert_eq!(s.current_time(), 2.5);
        assert_eq!(r.clock_label(&s), "0:02 / 0:10");

        assert!(!r.toggle_play().unwrap());
        r.surface_mut().advance(1.0);
        r.pump(&mut s).unwrap();
        assert_eq!(s.current_time(), 2.5);
    }

    #[test]
    fn end_of_media_stops_playing() {
        let mut s = session(3.0);
        let (mut r, _) = renderer(3.0);
        r.sync(&s).unwrap();
        r.toggle_play().unwrap();
        r.surface_mut().advance(5.0);
        r.pump(&mut s).unwrap();
        assert!(!r.is_playing());
        assert_eq!(s.current_time(), 3.0);
    }

    #[test]
    fn stale_time_updates_are_ignored_until_seek_lands() {
        let mut s = session(60.0);
        let (mut r, _) = renderer(60.0);
        r.sync(&s).unwrap();
        r.pump(&mut s).unwrap();

        r.seek_to(&mut s, 30.0).unwrap();
        assert_eq!(s.current_time(), 30.0);
        assert_eq!(r.arbiter().source(), TimeSource::FollowSeek { target: 30.0 });

        // A tick sampled before the seek took effect.
        r.handle_event(&mut s, PlaybackEvent::TimeUpdate(4.0));
        assert_eq!(s.current_time(), 30.0);

        // The surface queued Seeked(30.0) when it was told to seek.
        r.pump(&mut s).unwrap();
        assert_eq!(r.arbiter().source(), TimeSource::FollowPlayback);

        r.handle_event(&mut s, PlaybackEvent::TimeUpdate(30.25));
        assert_eq!(s.current_time(), 30.25);
    }

    #[test]
    fn seek_is_clamped_to_duration() {
        let mut s = session(8.0);
        let (mut r, _) = renderer(8.0);
        r.sync(&s).unwrap();
        r.scrub(&mut s, 100.0).unwrap();
        assert_eq!(s.current_time(), 8.0);
        assert_eq!(r.surface().position(), 8.0);
    }

    #[test]
    fn effects_become_surface_style() {
        let mut s = session(8.0);
        let (mut r, _) = renderer(8.0);
        s.toggle_effect(Effect::Blur);
        s.toggle_effect(Effect::BlackAndWhite);
        r.sync(&s).unwrap();
        assert!(r.surface().style().blur);
        assert!(r.surface().style().grayscale);
        assert!(!r.surface().style().sepia);

        s.toggle_effect(Effect::Blur);
        s.toggle_effect(Effect::FadeIn);
        r.sync(&s).unwrap();
        assert!(!r.style().blur);
        assert_eq!(r.style().css_filter(), "grayscale(100%)");
    }

    #[test]
    fn controls_need_a_bound_file() {
        let mut s = EditSession::new();
        let (mut r, _) = renderer(8.0);
        r.sync(&s).unwrap();
        assert!(matches!(r.toggle_play(), Err(PreviewError::NothingLoaded)));
        assert!(r.seek_to(&mut s, 1.0).is_err());
        assert_eq!(r.pump(&mut s).unwrap(), 0);
    }

    #[test]
    fn rejected_seek_keeps_following_playback() {
        let mut s = session(60.0);
        let surface = Unreliable {
            inner: HeadlessSurface::new().with_duration(60.0),
            failing_seeks: 1,
            ..Default::default()
        };
        let mut r = PreviewRenderer::new(surface, SourceRegistry::new());
        r.sync(&s).unwrap();
        r.pump(&mut s).unwrap();
        r.toggle_play().unwrap();

        assert!(r.seek_to(&mut s, 30.0).is_err());
        assert_eq!(r.arbiter().source(), TimeSource::FollowPlayback);
        assert_eq!(s.current_time(), 0.0);

        for _ in 0..4 {
            r.surface_mut().inner.advance(1.0);
        }
        r.pump(&mut s).unwrap();
        assert_eq!(s.current_time(), 4.0);

        // The next seek goes through normally.
        r.seek_to(&mut s, 30.0).unwrap();
        r.pump(&mut s).unwrap();
        assert_eq!(r.arbiter().source(), TimeSource::FollowPlayback);
        assert_eq!(s.current_time(), 30.0);
    }

    #[test]
    fn failed_load_leaves_a_clean_unbound_renderer() {
        let mut s = session(10.0);
        let surface = Unreliable {
            inner: HeadlessSurface::new().with_duration(10.0),
            ..Default::default()
        };
        let registry = SourceRegistry::new();
        let mut r = PreviewRenderer::new(surface, registry.clone());

        // Bind a first file and leave it playing mid-seek.
        let mut first = session(10.0);
        r.sync(&first).unwrap();
        r.pump(&mut first).unwrap();
        r.toggle_play().unwrap();
        r.seek_to(&mut first, 5.0).unwrap();
        assert!(matches!(r.arbiter().source(), TimeSource::FollowSeek { .. }));

        r.surface_mut().failing_loads = 1;
        assert!(r.sync(&s).is_err());
        assert!(!r.is_bound());
        assert!(!r.is_playing());
        assert_eq!(r.surface_duration(), None);
        assert_eq!(r.arbiter().source(), TimeSource::FollowPlayback);
        assert_eq!(registry.live(), 0);

        // Retrying binds normally.
        r.sync(&s).unwrap();
        assert!(r.is_bound());
        assert_eq!(registry.live(), 1);
        r.pump(&mut s).unwrap();
        assert_eq!(r.surface_duration(), Some(10.0));
    }
}

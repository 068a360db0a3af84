use std::path::PathBuf;
use videoflow_core::error::{ExportError, UploadError};
use videoflow_core::export::{ExportJob, ExportState};
use videoflow_core::notify::{Notification, NotificationLog, Notifier};
use videoflow_core::panel::{ControlPanelView, PanelAction, PanelControl, EXPORT_PRESETS, TOOLS};
use videoflow_core::session::EditSession;
use videoflow_core::timeline::TimelineView;
use videoflow_core::types::{Effect, FileHandle, VideoMetadata};
use videoflow_core::upload::{IntakeLimits, PendingProbe, UploadIntake, UploadOutcome, UploadProgress};
use videoflow_preview::error::PreviewError;
use videoflow_preview::lease::SourceRegistry;
use videoflow_preview::renderer::PreviewRenderer;

use crate::command::{Command, HELP};
use crate::surface::Surface;
use crate::view;

/// What the event loop has to do after a command.
#[derive(Debug)]
pub enum Step {
    Continue,
    Quit,
    /// Files need opening before they can go through intake.
    Open(Vec<PathBuf>),
    /// Run the export in the background.
    Export(ExportJob),
}

/// Owns the session and everything that reacts to it. All mutation happens
/// here, on the event loop; background work reports back through
/// [`finish_upload`](Editor::finish_upload) and
/// [`finish_export`](Editor::finish_export).
pub struct Editor {
    session: EditSession,
    intake: UploadIntake,
    export: ExportState,
    preview: PreviewRenderer<Surface>,
    notifications: NotificationLog,
    output: Vec<String>,
}

impl Editor {
    pub fn new(surface: Surface, limits: IntakeLimits) -> Self {
        let mut session = EditSession::new();
        session.subscribe(|change, _| tracing::debug!(?change, "Session changed"));

        Self {
            session,
            intake: UploadIntake::new(limits),
            export: ExportState::new(),
            preview: PreviewRenderer::new(surface, SourceRegistry::new()),
            notifications: NotificationLog::new(),
            output: Vec::new(),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn preview(&self) -> &PreviewRenderer<Surface> {
        &self.preview
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    fn say(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    // -- upload ---------------------------------------------------------------

    /// Validate a dropped batch. Rejections are already notified.
    pub fn begin_upload(&mut self, batch: Vec<FileHandle>) -> Option<PendingProbe> {
        self.intake
            .begin(batch, &mut self.notifications)
            .ok()
            .flatten()
    }

    pub fn upload_progress(&mut self, progress: UploadProgress) {
        self.say(progress.label());
    }

    pub fn finish_upload(
        &mut self,
        pending: PendingProbe,
        probed: Result<VideoMetadata, UploadError>,
    ) {
        let outcome = self
            .intake
            .finish(&mut self.session, pending, probed, &mut self.notifications);
        if let Ok(UploadOutcome::Loaded(_)) = outcome {
            self.sync_preview();
        }
    }

    // -- export ---------------------------------------------------------------

    pub fn finish_export(&mut self, outcome: Result<PathBuf, ExportError>) {
        let _ = self
            .export
            .finish(&mut self.session, outcome, &mut self.notifications);
    }

    // -- playback -------------------------------------------------------------

    /// Let `seconds` of wall time pass and pull playback events in.
    pub fn tick(&mut self, seconds: f64) {
        if self.preview.is_playing() {
            self.preview.surface_mut().advance(seconds);
        }
        if let Err(e) = self.preview.pump(&mut self.session) {
            tracing::warn!(error = %e, "Preview poll failed");
        }
    }

    fn sync_preview(&mut self) {
        let duration = self.session.duration();
        self.preview.surface_mut().expect_duration(duration);
        if let Err(e) = self.preview.sync(&self.session) {
            tracing::warn!(error = %e, "Preview sync failed");
            self.say(format!("preview: {e}"));
        }
    }

    fn preview_result(&mut self, result: Result<(), PreviewError>) {
        match result {
            Ok(()) => {}
            Err(PreviewError::NothingLoaded) => self.say("no video loaded"),
            Err(e) => {
                tracing::warn!(error = %e, "Preview command failed");
                self.say(format!("preview: {e}"));
            }
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if self.preview.is_playing() == playing {
            return;
        }
        let result = self.preview.toggle_play().map(|_| ());
        self.preview_result(result);
    }

    // -- commands -------------------------------------------------------------

    pub fn handle(&mut self, command: Command) -> Step {
        match command {
            Command::Open(paths) => return Step::Open(paths),
            Command::Play => self.set_playing(true),
            Command::Pause => self.set_playing(false),
            Command::TogglePlay => {
                let result = self.preview.toggle_play().map(|_| ());
                self.preview_result(result);
            }
            Command::Seek(t) => {
                let result = self.preview.scrub(&mut self.session, t);
                self.preview_result(result);
            }
            Command::Click { x, width } => {
                match TimelineView::from_session(&self.session).seek_from_click(x, width) {
                    Some(t) => {
                        let result = self.preview.seek_to(&mut self.session, t);
                        self.preview_result(result);
                    }
                    None => self.say("nothing to seek in"),
                }
            }
            Command::Effect(effect) => self.toggle_effect(effect),
            Command::Export => return self.start_export(),
            Command::Preset(i) => self.inert(PanelControl::Preset(i), EXPORT_PRESETS.get(i)),
            Command::Tool(i) => self.inert(PanelControl::Tool(i), TOOLS.get(i)),
            Command::Status { json: true } => match self.session.snapshot().to_json_pretty() {
                Ok(json) => self.say(json),
                Err(e) => self.say(format!("error: {e}")),
            },
            Command::Status { json: false } => {
                let clock = self.preview.clock_label(&self.session);
                let line = view::status(&self.session, &clock, self.preview.is_playing());
                self.say(line);
            }
            Command::Panel => {
                let text = view::panel(&ControlPanelView::from_session(&self.session));
                self.say(text);
            }
            Command::Timeline => {
                let text = view::timeline(&TimelineView::from_session(&self.session));
                self.say(text);
            }
            Command::Help => self.say(HELP),
            Command::Quit => return Step::Quit,
        }
        Step::Continue
    }

    fn toggle_effect(&mut self, effect: Effect) {
        let panel = ControlPanelView::from_session(&self.session);
        match panel.click(PanelControl::Effect(effect)) {
            Some(PanelAction::ToggleEffect(effect)) => {
                let active = self.session.toggle_effect(effect);
                self.say(format!("{}: {}", effect, if active { "on" } else { "off" }));
                self.sync_preview();
            }
            _ => self.say(format!("{effect} is disabled until a video is loaded")),
        }
    }

    fn start_export(&mut self) -> Step {
        let panel = ControlPanelView::from_session(&self.session);
        if panel.click(PanelControl::Export) != Some(PanelAction::Export) {
            self.say(if self.session.is_processing() {
                "an export is already running"
            } else {
                "load a video before exporting"
            });
            return Step::Continue;
        }
        match self.export.start(&mut self.session) {
            Ok(job) => {
                self.notifications
                    .notify(Notification::info(format!("Exporting {}...", job.output_name)));
                Step::Export(job)
            }
            Err(e) => {
                self.say(format!("export: {e}"));
                Step::Continue
            }
        }
    }

    fn inert(&mut self, control: PanelControl, label: Option<&&str>) {
        let Some(label) = label else {
            self.say("no such control");
            return;
        };
        let panel = ControlPanelView::from_session(&self.session);
        if panel.click(control).is_none() {
            if self.session.has_video() {
                self.say(format!("{label}: not available yet"));
            } else {
                self.say(format!("{label} is disabled until a video is loaded"));
            }
        }
    }
}

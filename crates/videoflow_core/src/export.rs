use crate::error::ExportError;
use crate::notify::{Notification, Notifier};
use crate::session::EditSession;
use crate::types::FileHandle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const EXPORT_PREFIX: &str = "edited_";

/// `clip.mp4` -> `edited_clip.mp4`.
pub fn export_file_name(original: &str) -> String {
    format!("{EXPORT_PREFIX}{original}")
}

/// What a running export works on.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub source: FileHandle,
    pub output_name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExportPhase {
    #[default]
    Idle,
    Processing(ExportJob),
}

/// Progress update while an export runs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ExportProgress {
    pub percent: f64,
}

/// `Idle -> Processing -> Idle`. Keeps the session's processing flag in
/// step with the phase.
#[derive(Debug, Default)]
pub struct ExportState {
    phase: ExportPhase,
}

impl ExportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &ExportPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, ExportPhase::Idle)
    }

    /// Enter `Processing` for the session's current file.
    pub fn start(&mut self, session: &mut EditSession) -> Result<ExportJob, ExportError> {
        if !self.is_idle() || session.is_processing() {
            return Err(ExportError::AlreadyRunning);
        }
        let source = session.file().cloned().ok_or(ExportError::NoVideo)?;
        let job = ExportJob {
            output_name: export_file_name(&source.name),
            source,
        };
        tracing::info!(output = %job.output_name, "Export started");
        self.phase = ExportPhase::Processing(job.clone());
        session.set_processing(true);
        Ok(job)
    }

    /// Return to `Idle` whatever the outcome and tell the user how it went.
    pub fn finish(
        &mut self,
        session: &mut EditSession,
        outcome: Result<PathBuf, ExportError>,
        notifier: &mut dyn Notifier,
    ) -> Result<PathBuf, ExportError> {
        let job = match std::mem::take(&mut self.phase) {
            ExportPhase::Processing(job) => Some(job),
            ExportPhase::Idle => None,
        };
        session.set_processing(false);

        match &outcome {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Export finished");
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .or(job.map(|j| j.output_name))
                    .unwrap_or_default();
                notifier.notify(Notification::success(format!("Export complete: {name}")));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Export failed");
                notifier.notify(Notification::error(format!("Export failed: {e}")));
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationLog;
    use crate::types::VideoMetadata;

    fn loaded() -> EditSession {
        let mut s = EditSession::new();
        let file = FileHandle::new("holiday.mp4", "/tmp/holiday.mp4", 3, "video/mp4");
        let meta = VideoMetadata::from_probe(&file, 4.0, 2, 2);
        s.set_video(file, meta);
        s
    }

    #[test]
    fn file_name_is_prefixed() {
        assert_eq!(export_file_name("a.mov"), "edited_a.mov");
    }

    #[test]
    fn start_requires_video() {
        let mut state = ExportState::new();
        let mut s = EditSession::new();
        assert_eq!(state.start(&mut s), Err(ExportError::NoVideo));
        assert!(!s.is_processing());
        assert!(state.is_idle());
    }

    #[test]
    fn processing_round_trip() {
        let mut state = ExportState::new();
        let mut s = loaded();
        let mut log = NotificationLog::new();

        let job = state.start(&mut s).unwrap();
        assert_eq!(job.output_name, "edited_holiday.mp4");
        assert!(s.is_processing());
        assert_eq!(state.phase(), &ExportPhase::Processing(job));
        assert_eq!(state.start(&mut s), Err(ExportError::AlreadyRunning));

        let path = state
            .finish(&mut s, Ok(PathBuf::from("/dl/edited_holiday.mp4")), &mut log)
            .unwrap();
        assert_eq!(path, PathBuf::from("/dl/edited_holiday.mp4"));
        assert!(!s.is_processing());
        assert!(state.is_idle());
        assert_eq!(log.pop().unwrap().message, "Export complete: edited_holiday.mp4");
    }

    #[test]
    fn failed_download_still_returns_to_idle() {
        let mut state = ExportState::new();
        let mut s = loaded();
        let mut log = NotificationLog::new();
        state.start(&mut s).unwrap();
        let err = state
            .finish(&mut s, Err(ExportError::Download("disk full".into())), &mut log)
            .unwrap_err();
        assert_eq!(err, ExportError::Download("disk full".into()));
        assert!(!s.is_processing());
        assert!(state.is_idle());
    }
}

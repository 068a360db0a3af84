use crate::error::UploadError;
use crate::notify::{Notification, Notifier};
use crate::session::EditSession;
use crate::types::{FileHandle, VideoMetadata};
use serde::{Deserialize, Serialize};

/// 100 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Extensions offered by the file picker, lower-case without the dot.
pub const ACCEPTED_EXTENSIONS: [&str; 6] = ["mp4", "avi", "mov", "wmv", "flv", "webm"];

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Video uploaded successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeLimits {
    pub max_bytes: u64,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// Check type first, then size.
pub fn validate(file: &FileHandle, limits: &IntakeLimits) -> Result<(), UploadError> {
    if !file.mime.starts_with("video/") {
        return Err(UploadError::InvalidType {
            mime: file.mime.clone(),
        });
    }
    if file.size > limits.max_bytes {
        return Err(UploadError::TooLarge {
            size: file.size,
            limit: limits.max_bytes,
        });
    }
    Ok(())
}

/// Identifies one accepted candidate. Only the newest ticket may load its
/// result into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProbeTicket(u64);

/// A validated file waiting for its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingProbe {
    pub ticket: ProbeTicket,
    pub file: FileHandle,
}

/// Simulated transfer progress between a successful probe and the load.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadProgress {
    pub percent: f64,
}

impl UploadProgress {
    /// `Uploading... 40%`
    pub fn label(&self) -> String {
        format!("Uploading... {:.0}%", self.percent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Loaded(VideoMetadata),
    /// A newer upload started while this one was probing.
    Discarded,
}

/// Validates candidates and applies probe results to the session.
///
/// Intake is split in two so the probe can run between the halves without
/// holding the session: [`UploadIntake::begin`] validates and issues a
/// ticket, [`UploadIntake::finish`] applies the probed metadata if the
/// ticket is still current.
#[derive(Debug, Default)]
pub struct UploadIntake {
    limits: IntakeLimits,
    latest: u64,
}

impl UploadIntake {
    pub fn new(limits: IntakeLimits) -> Self {
        Self { limits, latest: 0 }
    }

    /// Take the first file of `batch` and validate it. Remaining files are
    /// ignored and an empty batch yields `Ok(None)`. Failures are reported
    /// to `notifier` before being returned.
    pub fn begin(
        &mut self,
        batch: impl IntoIterator<Item = FileHandle>,
        notifier: &mut dyn Notifier,
    ) -> Result<Option<PendingProbe>, UploadError> {
        let mut batch = batch.into_iter();
        let Some(file) = batch.next() else {
            return Ok(None);
        };
        let ignored = batch.count();
        if ignored > 0 {
            tracing::debug!(ignored, "Extra files in drop ignored");
        }

        if let Err(e) = validate(&file, &self.limits) {
            tracing::warn!(name = %file.name, error = %e, "Upload rejected");
            notifier.notify(Notification::error(e.user_message()));
            return Err(e);
        }

        self.latest += 1;
        tracing::debug!(name = %file.name, ticket = self.latest, "Upload accepted, probing");
        Ok(Some(PendingProbe {
            ticket: ProbeTicket(self.latest),
            file,
        }))
    }

    pub fn is_current(&self, ticket: ProbeTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Apply the probe result for `pending`. A stale ticket leaves the
    /// session alone and says nothing to the user.
    pub fn finish(
        &mut self,
        session: &mut EditSession,
        pending: PendingProbe,
        probed: Result<VideoMetadata, UploadError>,
        notifier: &mut dyn Notifier,
    ) -> Result<UploadOutcome, UploadError> {
        if !self.is_current(pending.ticket) {
            tracing::debug!(name = %pending.file.name, "Stale probe result discarded");
            return Ok(UploadOutcome::Discarded);
        }

        match probed {
            Ok(metadata) => {
                session.set_video(pending.file, metadata.clone());
                notifier.notify(Notification::success(UPLOAD_SUCCESS_MESSAGE));
                Ok(UploadOutcome::Loaded(metadata))
            }
            Err(e) => {
                tracing::warn!(name = %pending.file.name, error = %e, "Probe failed");
                notifier.notify(Notification::error(e.user_message()));
                Err(e)
            }
        }
    }
}

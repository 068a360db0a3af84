use std::time::Duration;
use tokio::sync::watch;
use videoflow_core::error::UploadError;
use videoflow_core::notify::Notifier;
use videoflow_core::session::EditSession;
use videoflow_core::types::{FileHandle, VideoMetadata};
use videoflow_core::upload::{PendingProbe, UploadIntake, UploadOutcome, UploadProgress};

use crate::error::MediaError;
use crate::probe::MetadataProbe;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_UPLOAD_TICK: Duration = Duration::from_millis(200);
const UPLOAD_STEPS: u32 = 10;

/// How long an intake may take at each stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntakeTiming {
    /// Give up on the probe after this long.
    pub probe_timeout: Duration,
    /// Interval between 10% steps of the simulated transfer.
    pub upload_tick: Duration,
}

impl Default for IntakeTiming {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            upload_tick: DEFAULT_UPLOAD_TICK,
        }
    }
}

/// Probe `pending.file`, giving up after `timeout`. The pending upload is
/// handed back with the result so it can be passed to
/// [`UploadIntake::finish`].
pub async fn probe_pending<P: MetadataProbe>(
    probe: &P,
    pending: PendingProbe,
    timeout: Duration,
) -> (PendingProbe, Result<VideoMetadata, UploadError>) {
    let result = match tokio::time::timeout(timeout, probe.probe(&pending.file)).await {
        Ok(Ok(metadata)) => Ok(metadata),
        Ok(Err(e)) => Err(UploadError::from(e)),
        Err(_) => Err(UploadError::from(MediaError::Timeout(timeout))),
    };
    (pending, result)
}

/// Simulated transfer: 10% per tick up to 100%, held for one more tick
/// before the file is handed over.
pub async fn simulate_upload(tick: Duration, progress_tx: &watch::Sender<UploadProgress>) {
    for i in 1..=UPLOAD_STEPS {
        tokio::time::sleep(tick).await;
        let percent = f64::from(i) / f64::from(UPLOAD_STEPS) * 100.0;
        let _ = progress_tx.send(UploadProgress { percent });
    }
    tokio::time::sleep(tick).await;
}

/// Probe, then run the simulated transfer if the probe succeeded. A failed
/// probe reports no progress at all.
pub async fn receive<P: MetadataProbe>(
    probe: &P,
    pending: PendingProbe,
    timing: IntakeTiming,
    progress_tx: watch::Sender<UploadProgress>,
) -> (PendingProbe, Result<VideoMetadata, UploadError>) {
    let (pending, probed) = probe_pending(probe, pending, timing.probe_timeout).await;
    if probed.is_ok() {
        tracing::debug!(name = %pending.file.name, "Probe done, transferring");
        simulate_upload(timing.upload_tick, &progress_tx).await;
    }
    (pending, probed)
}

/// Validate, probe, transfer and load one upload in sequence.
///
/// Returns `Ok(None)` for an empty batch. Every failure has already been
/// reported to `notifier` when it is returned.
pub async fn upload<P: MetadataProbe>(
    intake: &mut UploadIntake,
    session: &mut EditSession,
    probe: &P,
    timing: IntakeTiming,
    batch: impl IntoIterator<Item = FileHandle>,
    progress_tx: watch::Sender<UploadProgress>,
    notifier: &mut dyn Notifier,
) -> Result<Option<UploadOutcome>, UploadError> {
    let Some(pending) = intake.begin(batch, notifier)? else {
        return Ok(None);
    };
    let (pending, probed) = receive(probe, pending, timing, progress_tx).await;
    intake.finish(session, pending, probed, notifier).map(Some)
}

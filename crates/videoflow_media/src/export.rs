use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use videoflow_core::error::ExportError;
use videoflow_core::export::{ExportJob, ExportProgress};

use crate::download::DownloadSink;

pub const DEFAULT_EXPORT_DELAY: Duration = Duration::from_secs(3);
const PROGRESS_TICKS: u32 = 10;

/// Simulated export: waits out a fixed delay while publishing progress,
/// then hands the untouched source to the download sink under the job's
/// output name. Nothing is re-encoded.
#[derive(Debug, Clone)]
pub struct ExportOrchestrator<S> {
    delay: Duration,
    sink: S,
}

impl<S: DownloadSink> ExportOrchestrator<S> {
    pub fn new(sink: S, delay: Duration) -> Self {
        Self { delay, sink }
    }

    /// Run `job` to completion. There is no cancellation.
    pub async fn run(
        &self,
        job: &ExportJob,
        progress_tx: watch::Sender<ExportProgress>,
    ) -> Result<PathBuf, ExportError> {
        let tick = self.delay / PROGRESS_TICKS;
        for i in 1..=PROGRESS_TICKS {
            tokio::time::sleep(tick).await;
            let percent = f64::from(i) / f64::from(PROGRESS_TICKS) * 100.0;
            let _ = progress_tx.send(ExportProgress { percent });
        }
        tracing::debug!(source = %job.source.path.display(), "Simulated processing done");

        self.sink
            .save(&job.source.path, &job.output_name)
            .await
            .map_err(|e| ExportError::Download(e.to_string()))
    }
}

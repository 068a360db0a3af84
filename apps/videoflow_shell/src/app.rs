use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use videoflow_core::error::{ExportError, UploadError};
use videoflow_core::export::{ExportJob, ExportProgress};
use videoflow_core::types::{FileHandle, VideoMetadata};
use videoflow_core::upload::{PendingProbe, UploadProgress};
use videoflow_media::download::DirectoryDownloads;
use videoflow_media::export::ExportOrchestrator;
use videoflow_media::intake::{receive, IntakeTiming};
use videoflow_media::mime::open_local;
use videoflow_media::probe::{FfprobeProbe, MetadataProbe};

use crate::command::Command;
use crate::config::ShellConfig;
use crate::editor::{Editor, Step};
use crate::view;

type Received = (PendingProbe, Result<VideoMetadata, UploadError>);
type ExportResult = Result<PathBuf, ExportError>;

/// Something a background task reported.
enum TaskEvent {
    UploadProgress(UploadProgress),
    Received(Result<Received, JoinError>),
    ExportProgress(ExportProgress),
    Exported(ExportResult),
}

/// Background work the loop is waiting on.
struct Tasks<P> {
    probe: P,
    timing: IntakeTiming,
    uploads: JoinSet<Received>,
    upload_progress: Option<watch::Receiver<UploadProgress>>,
    orchestrator: ExportOrchestrator<DirectoryDownloads>,
    export: Option<JoinHandle<ExportResult>>,
    export_progress: Option<watch::Receiver<ExportProgress>>,
}

impl<P: MetadataProbe + Clone + 'static> Tasks<P> {
    fn new(config: &ShellConfig, probe: P) -> Self {
        Self {
            probe,
            timing: config.intake_timing(),
            uploads: JoinSet::new(),
            upload_progress: None,
            orchestrator: ExportOrchestrator::new(
                DirectoryDownloads::new(&config.downloads_dir),
                config.export_delay,
            ),
            export: None,
            export_progress: None,
        }
    }

    /// Only the newest upload's progress is shown.
    fn spawn_upload(&mut self, pending: PendingProbe) {
        let (tx, rx) = watch::channel(UploadProgress::default());
        let probe = self.probe.clone();
        let timing = self.timing;
        self.uploads
            .spawn_local(async move { receive(&probe, pending, timing, tx).await });
        self.upload_progress = Some(rx);
    }

    fn spawn_export(&mut self, job: ExportJob) {
        let (tx, rx) = watch::channel(ExportProgress::default());
        let orchestrator = self.orchestrator.clone();
        self.export = Some(tokio::task::spawn_local(async move {
            orchestrator.run(&job, tx).await
        }));
        self.export_progress = Some(rx);
    }

    /// Wait for the next report. Pends forever when nothing is running.
    async fn next_event(&mut self) -> TaskEvent {
        tokio::select! {
            biased;
            progress = changed(&mut self.upload_progress) => TaskEvent::UploadProgress(progress),
            progress = changed(&mut self.export_progress) => TaskEvent::ExportProgress(progress),
            Some(joined) = self.uploads.join_next() => TaskEvent::Received(joined),
            joined = export_done(&mut self.export) => {
                self.export = None;
                self.export_progress = None;
                TaskEvent::Exported(
                    joined.unwrap_or_else(|e| Err(ExportError::Download(e.to_string()))),
                )
            }
        }
    }

    fn abort(&mut self) {
        self.uploads.abort_all();
        if let Some(export) = self.export.take() {
            tracing::warn!("Quitting with an export still running");
            export.abort();
        }
    }
}

async fn export_done(task: &mut Option<JoinHandle<ExportResult>>) -> Result<ExportResult, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Next unseen value. Forgets the receiver once its sender is gone.
async fn changed<T: Copy>(rx: &mut Option<watch::Receiver<T>>) -> T {
    if let Some(inner) = rx {
        if inner.changed().await.is_ok() {
            return *inner.borrow_and_update();
        }
        *rx = None;
    }
    std::future::pending().await
}

fn apply(editor: &mut Editor, event: TaskEvent) {
    match event {
        TaskEvent::UploadProgress(progress) => editor.upload_progress(progress),
        TaskEvent::Received(Ok((pending, probed))) => editor.finish_upload(pending, probed),
        TaskEvent::Received(Err(e)) => tracing::error!(error = %e, "Upload task failed"),
        TaskEvent::ExportProgress(progress) => {
            tracing::debug!(percent = progress.percent, "Export progress")
        }
        TaskEvent::Exported(outcome) => editor.finish_export(outcome),
    }
}

/// Open dropped paths as file handles. The first path decides the upload,
/// so failing to open it abandons the batch.
async fn open_batch(paths: Vec<PathBuf>) -> Vec<FileHandle> {
    let mut batch = Vec::with_capacity(paths.len());
    for path in paths {
        match open_local(&path).await {
            Ok(handle) => batch.push(handle),
            Err(e) if batch.is_empty() => {
                println!("error: {e}");
                return Vec::new();
            }
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "Skipping extra file"),
        }
    }
    batch
}

async fn open<P>(editor: &mut Editor, tasks: &mut Tasks<P>, paths: Vec<PathBuf>)
where
    P: MetadataProbe + Clone + 'static,
{
    let batch = open_batch(paths).await;
    if batch.is_empty() {
        return;
    }
    if let Some(pending) = editor.begin_upload(batch) {
        println!("Reading {}...", pending.file.name);
        tasks.spawn_upload(pending);
    }
}

fn flush(editor: &mut Editor) {
    for line in editor.take_output() {
        println!("{line}");
    }
    for n in editor.take_notifications() {
        println!("{}", view::notification(&n));
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Run the shell until `quit` or end of input. Must be driven inside a
/// `LocalSet`: uploads and exports are spawned as local tasks.
pub async fn run(config: ShellConfig, mut editor: Editor, initial: Option<PathBuf>) -> anyhow::Result<()> {
    let mut tasks = Tasks::new(&config, FfprobeProbe::new());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let tick_secs = config.tick.as_secs_f64();

    println!("VideoFlow ({} preview). Type `help` for commands.", editor.preview().surface().name());
    if let Some(path) = initial {
        open(&mut editor, &mut tasks, vec![path]).await;
    }
    flush(&mut editor);
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(None) => {}
                    Ok(Some(command)) => match editor.handle(command) {
                        Step::Continue => {}
                        Step::Quit => break,
                        Step::Open(paths) => open(&mut editor, &mut tasks, paths).await,
                        Step::Export(job) => tasks.spawn_export(job),
                    },
                    Err(e) => println!("error: {e:#}"),
                }
                flush(&mut editor);
                prompt();
            }
            event = tasks.next_event() => {
                let quiet = matches!(event, TaskEvent::ExportProgress(_));
                apply(&mut editor, event);
                if !quiet {
                    println!();
                    flush(&mut editor);
                    prompt();
                }
            }
            _ = ticker.tick() => {
                editor.tick(tick_secs);
                flush(&mut editor);
            }
        }
    }

    tasks.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::task::LocalSet;
    use videoflow_core::notify::NotificationLevel;
    use videoflow_core::upload::IntakeLimits;
    use videoflow_media::error::Result as MediaResult;
    use videoflow_preview::headless::HeadlessSurface;

    use crate::surface::Surface;

    /// Reports every file as an 8 second 640x360 clip.
    #[derive(Clone)]
    struct FixedMetadata;

    impl MetadataProbe for FixedMetadata {
        async fn probe(&self, file: &FileHandle) -> MediaResult<VideoMetadata> {
            Ok(VideoMetadata::from_probe(file, 8.0, 640, 360))
        }
    }

    async fn drain_until<P>(
        editor: &mut Editor,
        tasks: &mut Tasks<P>,
        done: impl Fn(&Editor) -> bool,
    ) -> Vec<String>
    where
        P: MetadataProbe + Clone + 'static,
    {
        let mut output = Vec::new();
        for _ in 0..50 {
            if done(editor) {
                return output;
            }
            let event = tasks.next_event().await;
            apply(editor, event);
            output.extend(editor.take_output());
        }
        panic!("tasks never settled, output so far: {output:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn upload_then_export_through_background_tasks() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("clip.mp4");
        let content = b"\x00\x00\x00\x18ftypmp42 clip bytes".to_vec();
        std::fs::write(&source, &content).unwrap();
        let config = ShellConfig {
            export_delay: Duration::from_millis(300),
            downloads_dir: dir.path().join("downloads"),
            ..ShellConfig::default()
        };

        LocalSet::new()
            .run_until(async move {
                let mut editor = Editor::new(
                    Surface::Headless(HeadlessSurface::new()),
                    IntakeLimits::default(),
                );
                let mut tasks = Tasks::new(&config, FixedMetadata);

                open(&mut editor, &mut tasks, vec![source]).await;
                let shown = drain_until(&mut editor, &mut tasks, |ed| ed.session().has_video()).await;
                assert_eq!(shown.len(), 10);
                assert_eq!(shown[0], "Uploading... 10%");
                assert_eq!(shown[9], "Uploading... 100%");
                let notes = editor.take_notifications();
                assert_eq!(notes[0].message, "Video uploaded successfully!");
                assert!(editor.preview().is_bound());

                let Step::Export(job) = editor.handle(Command::Export) else {
                    panic!("export did not start");
                };
                tasks.spawn_export(job);
                assert!(editor.session().is_processing());
                drain_until(&mut editor, &mut tasks, |ed| !ed.session().is_processing()).await;

                let notes = editor.take_notifications();
                let last = notes.last().unwrap();
                assert_eq!(last.level, NotificationLevel::Success);
                assert_eq!(last.message, "Export complete: edited_clip.mp4");
                assert!(tasks.export.is_none());

                let saved = std::fs::read(config.downloads_dir.join("edited_clip.mp4")).unwrap();
                assert_eq!(saved, content);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn newer_upload_takes_over_the_progress_display() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.mp4");
        let second = dir.path().join("second.webm");
        std::fs::write(&first, b"one").unwrap();
        std::fs::write(&second, b"two").unwrap();
        let config = ShellConfig::default();

        LocalSet::new()
            .run_until(async move {
                let mut editor = Editor::new(
                    Surface::Headless(HeadlessSurface::new()),
                    IntakeLimits::default(),
                );
                let mut tasks = Tasks::new(&config, FixedMetadata);

                open(&mut editor, &mut tasks, vec![first]).await;
                open(&mut editor, &mut tasks, vec![second]).await;

                let mut shown = Vec::new();
                let mut received = 0;
                for _ in 0..50 {
                    if received == 2 {
                        break;
                    }
                    let event = tasks.next_event().await;
                    if matches!(event, TaskEvent::Received(_)) {
                        received += 1;
                    }
                    apply(&mut editor, event);
                    shown.extend(editor.take_output());
                }
                assert_eq!(received, 2);
                assert_eq!(shown.len(), 10);
                assert_eq!(editor.session().file().unwrap().name, "second.webm");
                assert_eq!(editor.take_notifications().len(), 1);
            })
            .await;
    }
}

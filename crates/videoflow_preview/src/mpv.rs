use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{PreviewError, Result};
use crate::style::PresentationStyle;
use crate::surface::{PlaybackEvent, PlaybackSurface};

const WINDOW_TITLE: &str = "videoflow-preview";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Playback through an mpv window driven over its JSON IPC socket.
///
/// Socket I/O happens on a worker thread: surface calls only queue
/// requests, and [`poll_events`](PlaybackSurface::poll_events) drains what
/// the worker has observed. The worker samples `time-pos`, `duration` and
/// `eof-reached` while idle and turns changes into events.
pub struct MpvSurface {
    process: Option<Child>,
    socket_path: PathBuf,
    requests: Option<Sender<Request>>,
    events: Receiver<(u64, PlaybackEvent)>,
    worker: Option<JoinHandle<()>>,
    generation: u64,
}

enum Request {
    Load { path: PathBuf, generation: u64 },
    Unload,
    Play,
    Pause,
    Seek(f64),
    Filter(String),
}

impl MpvSurface {
    /// Start mpv idle with a window and wait for its IPC socket.
    pub fn launch() -> Result<Self> {
        let socket_path =
            std::env::temp_dir().join(format!("videoflow-mpv-{}", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let log_path =
            std::env::temp_dir().join(format!("videoflow-mpv-{}.log", std::process::id()));
        let log_file = std::fs::File::create(&log_path).ok();
        tracing::info!(log = %log_path.display(), "Starting mpv");

        let mut child = Command::new("mpv")
            .args([
                "--idle=yes",
                "--keep-open=yes",
                "--force-window=yes",
                "--pause=yes",
                "--osc=no",
                "--osd-level=0",
                &format!("--title={WINDOW_TITLE}"),
                &format!("--input-ipc-server={}", socket_path.display()),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(log_file.map(Stdio::from).unwrap_or(Stdio::null()))
            .spawn()
            .map_err(|e| PreviewError::MpvStart(e.to_string()))?;

        // Wait for socket
        for _ in 0..50 {
            if socket_path.exists() {
                let mut surface = Self::attach(socket_path);
                surface.process = Some(child);
                return Ok(surface);
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        let _ = child.kill();
        let _ = child.wait();
        Err(PreviewError::MpvStart("mpv socket did not appear".into()))
    }

    /// Drive an mpv that is already listening on `socket_path`.
    pub fn attach(socket_path: PathBuf) -> Self {
        let (request_tx, request_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let worker = Worker {
            ipc: Ipc {
                socket_path: socket_path.clone(),
            },
            events: event_tx,
            generation: 0,
            loaded: false,
            last_position: None,
            duration_reported: false,
            ended: false,
        };
        let handle = std::thread::Builder::new()
            .name("mpv-ipc".into())
            .spawn(move || worker.run(request_rx))
            .ok();

        Self {
            process: None,
            socket_path,
            requests: handle.as_ref().map(|_| request_tx),
            events: event_rx,
            worker: handle,
            generation: 0,
        }
    }

    fn request(&self, request: Request) -> Result<()> {
        self.requests
            .as_ref()
            .ok_or_else(|| PreviewError::MpvIpc("player stopped".into()))?
            .send(request)
            .map_err(|_| PreviewError::MpvIpc("player worker exited".into()))
    }

    pub fn stop(&mut self) {
        self.requests = None;
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

impl PlaybackSurface for MpvSurface {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.generation += 1;
        self.request(Request::Load {
            path: path.to_path_buf(),
            generation: self.generation,
        })
    }

    fn unload(&mut self) -> Result<()> {
        self.generation += 1;
        self.request(Request::Unload)
    }

    fn play(&mut self) -> Result<()> {
        self.request(Request::Play)
    }

    fn pause(&mut self) -> Result<()> {
        self.request(Request::Pause)
    }

    /// Always lands: if mpv refuses, `Seeked` reports where playback
    /// actually is.
    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.request(Request::Seek(seconds))
    }

    fn set_style(&mut self, style: &PresentationStyle) -> Result<()> {
        let chain = style.lavfi_chain();
        let vf = if chain.is_empty() {
            String::new()
        } else {
            format!("lavfi=[{chain}]")
        };
        self.request(Request::Filter(vf))
    }

    fn poll_events(&mut self) -> Result<Vec<PlaybackEvent>> {
        Ok(self
            .events
            .try_iter()
            .filter(|(generation, _)| *generation == self.generation)
            .map(|(_, event)| event)
            .collect())
    }
}

impl Drop for MpvSurface {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// IPC worker
// ---------------------------------------------------------------------------

struct Ipc {
    socket_path: PathBuf,
}

impl Ipc {
    fn send_command(&self, command: Value) -> Result<Value> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .map_err(|e| PreviewError::MpvIpc(format!("connect: {e}")))?;
        stream.set_read_timeout(Some(Duration::from_secs(2))).ok();

        let msg = format!("{command}\n");
        stream
            .write_all(msg.as_bytes())
            .map_err(|e| PreviewError::MpvIpc(format!("write: {e}")))?;

        // mpv may interleave event lines; the reply is the line carrying
        // an "error" field.
        let mut reader = BufReader::new(stream);
        loop {
            let mut line = String::new();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| PreviewError::MpvIpc(format!("read: {e}")))?;
            if n == 0 {
                return Err(PreviewError::MpvIpc("connection closed".into()));
            }
            let value: Value = serde_json::from_str(&line)?;
            match value.get("error").and_then(|e| e.as_str()) {
                Some("success") => return Ok(value),
                Some(err) => return Err(PreviewError::MpvCommand(err.to_string())),
                None => continue,
            }
        }
    }

    fn get_property(&self, name: &str) -> Result<Value> {
        match self.send_command(json!({ "command": ["get_property", name] })) {
            Ok(resp) => Ok(resp.get("data").cloned().unwrap_or(Value::Null)),
            // Idle player or nothing decoded yet.
            Err(PreviewError::MpvCommand(e)) if e == "property unavailable" => Ok(Value::Null),
            Err(e) => Err(e),
        }
    }

    fn set_property(&self, name: &str, value: Value) -> Result<()> {
        self.send_command(json!({ "command": ["set_property", name, value] }))?;
        Ok(())
    }
}

struct Worker {
    ipc: Ipc,
    events: Sender<(u64, PlaybackEvent)>,
    generation: u64,
    loaded: bool,
    last_position: Option<f64>,
    duration_reported: bool,
    ended: bool,
}

impl Worker {
    fn run(mut self, requests: Receiver<Request>) {
        loop {
            match requests.recv_timeout(POLL_INTERVAL) {
                Ok(request) => {
                    if let Err(e) = self.apply(request) {
                        tracing::warn!(error = %e, "mpv request failed");
                    }
                }
                Err(RecvTimeoutError::Timeout) if self.loaded => {
                    if let Err(e) = self.poll() {
                        tracing::debug!(error = %e, "mpv poll failed");
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::debug!("mpv IPC worker stopped");
    }

    fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.send((self.generation, event));
    }

    fn apply(&mut self, request: Request) -> Result<()> {
        match request {
            Request::Load { path, generation } => {
                self.generation = generation;
                self.loaded = false;
                self.last_position = None;
                self.duration_reported = false;
                self.ended = false;
                let path = path.to_string_lossy();
                self.ipc
                    .send_command(json!({ "command": ["loadfile", path, "replace"] }))?;
                self.ipc.set_property("pause", json!(true))?;
                self.loaded = true;
            }
            Request::Unload => {
                self.loaded = false;
                self.last_position = None;
                self.ipc.send_command(json!({ "command": ["stop"] }))?;
            }
            Request::Play => {
                if self.ended {
                    self.ipc
                        .send_command(json!({ "command": ["seek", 0, "absolute"] }))?;
                    self.ended = false;
                }
                self.ipc.set_property("pause", json!(false))?;
            }
            Request::Pause => self.ipc.set_property("pause", json!(true))?,
            Request::Seek(seconds) => {
                let sent = self
                    .ipc
                    .send_command(json!({ "command": ["seek", seconds, "absolute+exact"] }));
                match sent {
                    Ok(_) => {
                        self.ended = false;
                        self.last_position = Some(seconds);
                        self.emit(PlaybackEvent::Seeked(seconds));
                    }
                    Err(e) => {
                        let here = self
                            .ipc
                            .get_property("time-pos")
                            .ok()
                            .and_then(|v| v.as_f64())
                            .or(self.last_position)
                            .unwrap_or(0.0);
                        self.emit(PlaybackEvent::Seeked(here));
                        return Err(e);
                    }
                }
            }
            Request::Filter(vf) => self.ipc.set_property("vf", json!(vf))?,
        }
        Ok(())
    }

    fn poll(&mut self) -> Result<()> {
        if !self.duration_reported {
            if let Some(duration) = self.ipc.get_property("duration")?.as_f64() {
                self.duration_reported = true;
                self.emit(PlaybackEvent::MetadataLoaded { duration });
            }
        }

        if let Some(pos) = self.ipc.get_property("time-pos")?.as_f64() {
            if self.last_position != Some(pos) {
                self.last_position = Some(pos);
                self.emit(PlaybackEvent::TimeUpdate(pos));
            }
        }

        let eof = self.ipc.get_property("eof-reached")?.as_bool().unwrap_or(false);
        if eof && !self.ended {
            self.ended = true;
            self.emit(PlaybackEvent::Ended);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::time::Instant;
    use tempfile::TempDir;

    /// A stand-in mpv that answers properties with fixed values and
    /// refuses every seek.
    fn fake_mpv(dir: &Path) -> PathBuf {
        let path = dir.join("mpv.sock");
        let listener = UnixListener::bind(&path).unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut writer = stream;
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap_or(0) > 0 {
                    let request: Value = serde_json::from_str(&line).unwrap();
                    let reply = answer(&request["command"]);
                    if writeln!(writer, "{reply}").is_err() {
                        break;
                    }
                    line.clear();
                }
            }
        });
        path
    }

    fn answer(command: &Value) -> Value {
        match (command[0].as_str(), command[1].as_str()) {
            (Some("seek"), _) => json!({ "error": "invalid parameter" }),
            (Some("get_property"), Some("duration")) => json!({ "error": "success", "data": 10.0 }),
            (Some("get_property"), Some("time-pos")) => json!({ "error": "success", "data": 2.5 }),
            (Some("get_property"), Some("eof-reached")) => {
                json!({ "error": "success", "data": false })
            }
            _ => json!({ "error": "success" }),
        }
    }

    fn collect_until(
        mpv: &mut MpvSurface,
        done: impl Fn(&[PlaybackEvent]) -> bool,
    ) -> Vec<PlaybackEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            seen.extend(mpv.poll_events().unwrap());
            if done(&seen) {
                return seen;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("events never arrived, saw {seen:?}");
    }

    #[test]
    fn polling_reports_duration_and_position() {
        let dir = TempDir::new().unwrap();
        let mut mpv = MpvSurface::attach(fake_mpv(dir.path()));
        mpv.load(Path::new("/tmp/clip.mp4")).unwrap();

        let seen = collect_until(&mut mpv, |seen| {
            seen.contains(&PlaybackEvent::MetadataLoaded { duration: 10.0 })
                && seen.contains(&PlaybackEvent::TimeUpdate(2.5))
        });
        assert!(!seen.contains(&PlaybackEvent::Ended));
    }

    #[test]
    fn calls_return_without_waiting_on_the_socket() {
        let dir = TempDir::new().unwrap();
        let mut mpv = MpvSurface::attach(dir.path().join("nobody-listens.sock"));
        let start = Instant::now();
        mpv.load(Path::new("/tmp/clip.mp4")).unwrap();
        mpv.play().unwrap();
        mpv.seek(3.0).unwrap();
        mpv.pause().unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn refused_seek_lands_where_playback_is() {
        let dir = TempDir::new().unwrap();
        let mut mpv = MpvSurface::attach(fake_mpv(dir.path()));
        mpv.load(Path::new("/tmp/clip.mp4")).unwrap();
        mpv.seek(5.0).unwrap();

        let seen = collect_until(&mut mpv, |seen| {
            seen.iter().any(|e| matches!(e, PlaybackEvent::Seeked(_)))
        });
        assert!(seen.contains(&PlaybackEvent::Seeked(2.5)));
        assert!(!seen.contains(&PlaybackEvent::Seeked(5.0)));
    }

    #[test]
    fn events_from_a_previous_file_are_dropped() {
        let dir = TempDir::new().unwrap();
        let mut mpv = MpvSurface::attach(fake_mpv(dir.path()));
        mpv.load(Path::new("/tmp/a.mp4")).unwrap();
        collect_until(&mut mpv, |seen| !seen.is_empty());

        std::thread::sleep(POLL_INTERVAL * 3);
        mpv.load(Path::new("/tmp/b.mp4")).unwrap();
        let seen = collect_until(&mut mpv, |seen| {
            seen.iter()
                .any(|e| matches!(e, PlaybackEvent::MetadataLoaded { .. }))
        });
        // The new file reports its duration afresh; nothing older leaks in.
        assert_eq!(
            seen.iter()
                .filter(|e| matches!(e, PlaybackEvent::MetadataLoaded { .. }))
                .count(),
            1
        );
    }
}

use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use videoflow_core::types::{FileHandle, VideoMetadata};

use crate::error::{MediaError, Result};

/// Reads duration and dimensions from a media file without decoding it.
pub trait MetadataProbe {
    fn probe(&self, file: &FileHandle) -> impl Future<Output = Result<VideoMetadata>>;
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

// ---------------------------------------------------------------------------
// FfprobeProbe
// ---------------------------------------------------------------------------

/// Probes by running `ffprobe` as a child process. The child is killed if
/// the returned future is dropped, so a caller-side timeout cleans up.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }

    /// Use a different ffprobe binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, path: &Path) -> Result<FfprobeOutput> {
        let output = tokio::process::Command::new(&self.program)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::FfprobeExec(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::FfprobeFailed(stderr.into_owned()));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl MetadataProbe for FfprobeProbe {
    async fn probe(&self, file: &FileHandle) -> Result<VideoMetadata> {
        if !file.path.exists() {
            return Err(MediaError::FileNotFound(file.path.clone()));
        }
        tracing::debug!(path = %file.path.display(), "Running ffprobe");
        let output = self.run(&file.path).await?;
        parse_probe_output(&output, file)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn parse_probe_output(probe: &FfprobeOutput, file: &FileHandle) -> Result<VideoMetadata> {
    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or(MediaError::NoVideoStream)?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .or(video_stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let width = video_stream.width.unwrap_or(0);
    let height = video_stream.height.unwrap_or(0);

    Ok(VideoMetadata::from_probe(file, duration, width, height))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Shell configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use videoflow_core::upload::MAX_UPLOAD_BYTES;
use videoflow_media::export::DEFAULT_EXPORT_DELAY;
use videoflow_media::intake::{IntakeTiming, DEFAULT_PROBE_TIMEOUT, DEFAULT_UPLOAD_TICK};

/// Which playback surface backs the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewBackend {
    Mpv,
    Headless,
}

impl FromStr for PreviewBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mpv" => Ok(PreviewBackend::Mpv),
            "headless" | "none" => Ok(PreviewBackend::Headless),
            other => anyhow::bail!("unknown preview backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Simulated export duration
    pub export_delay: Duration,
    /// Give up on metadata probing after this long
    pub probe_timeout: Duration,
    /// Interval between simulated upload progress steps
    pub upload_tick: Duration,
    /// Where exported files are saved
    pub downloads_dir: PathBuf,
    /// Upload size limit in bytes
    pub max_upload_bytes: u64,
    pub preview: PreviewBackend,
    /// How often playback position is sampled
    pub tick: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            export_delay: DEFAULT_EXPORT_DELAY,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            upload_tick: DEFAULT_UPLOAD_TICK,
            downloads_dir: default_downloads_dir(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            preview: PreviewBackend::Mpv,
            tick: Duration::from_millis(250),
        }
    }
}

impl ShellConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            export_delay: parsed("VIDEOFLOW_EXPORT_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.export_delay),
            probe_timeout: parsed("VIDEOFLOW_PROBE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_timeout),
            upload_tick: parsed("VIDEOFLOW_UPLOAD_TICK_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.upload_tick),
            downloads_dir: lookup("VIDEOFLOW_DOWNLOADS_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.downloads_dir),
            max_upload_bytes: parsed("VIDEOFLOW_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
            preview: lookup("VIDEOFLOW_PREVIEW")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.preview),
            tick: parsed("VIDEOFLOW_TICK_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick),
        }
    }

    pub fn intake_timing(&self) -> IntakeTiming {
        IntakeTiming {
            probe_timeout: self.probe_timeout,
            upload_tick: self.upload_tick,
        }
    }
}

fn default_downloads_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

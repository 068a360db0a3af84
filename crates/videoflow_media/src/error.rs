use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use videoflow_core::error::UploadError;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    #[error("failed to execute ffprobe: {0}")]
    FfprobeExec(String),

    #[error("ffprobe failed: {0}")]
    FfprobeFailed(String),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<MediaError> for UploadError {
    fn from(e: MediaError) -> Self {
        UploadError::MetadataError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;

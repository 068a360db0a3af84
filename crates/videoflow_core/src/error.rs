use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Failures surfaced at the upload boundary. None of them touch the session.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UploadError {
    #[error("not a video file: {mime}")]
    InvalidType { mime: String },

    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("could not read video metadata: {0}")]
    MetadataError(String),
}

impl UploadError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            UploadError::InvalidType { .. } => "Please upload a video file",
            UploadError::TooLarge { .. } => "File size must be less than 100MB",
            UploadError::MetadataError(_) => "Failed to process video file",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExportError {
    #[error("no video loaded")]
    NoVideo,

    #[error("an export is already running")]
    AlreadyRunning,

    #[error("download failed: {0}")]
    Download(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to start mpv: {0}")]
    MpvStart(String),

    #[error("mpv IPC error: {0}")]
    MpvIpc(String),

    #[error("mpv rejected command: {0}")]
    MpvCommand(String),

    #[error("no media loaded")]
    NothingLoaded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PreviewError>;

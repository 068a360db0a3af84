use std::path::Path;
use videoflow_core::types::FileHandle;

use crate::error::{MediaError, Result};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type for a local file, judged by extension the way a browser file
/// picker would.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => OCTET_STREAM,
    }
}

/// Turn a path into the handle the intake works with.
pub async fn open_local(path: impl AsRef<Path>) -> Result<FileHandle> {
    let path = path.as_ref();
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(MediaError::Io(e)),
    };
    if !meta.is_file() {
        return Err(MediaError::NotAFile(path.to_path_buf()));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(FileHandle::new(name, path, meta.len(), mime_for_path(path)))
}

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Where "downloads" go. Given the source bytes and a suggested name, save
/// a copy and return where it landed.
pub trait DownloadSink {
    fn save(&self, source: &Path, suggested_name: &str) -> impl Future<Output = Result<PathBuf>>;
}

/// Saves into a directory, never overwriting: `name.mp4` becomes
/// `name (1).mp4`, `name (2).mp4`, ... when taken.
#[derive(Debug, Clone)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectoryDownloads {
    async fn save(&self, source: &Path, suggested_name: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let target = free_path(&self.dir, &sanitize_file_name(suggested_name)).await;
        let bytes = tokio::fs::copy(source, &target).await?;
        tracing::info!(path = %target.display(), bytes, "Download saved");
        Ok(target)
    }
}

/// Strip path separators so a name can only land inside the directory.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "download".to_string(),
        _ => cleaned,
    }
}

async fn free_path(dir: &Path, name: &str) -> PathBuf {
    let first = dir.join(name);
    if !tokio::fs::try_exists(&first).await.unwrap_or(false) {
        return first;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let mut n = 1u32;
    loop {
        let candidate = match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        };
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }
        n += 1;
    }
}

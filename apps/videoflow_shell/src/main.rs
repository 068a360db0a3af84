mod app;
mod command;
mod config;
mod editor;
mod surface;
mod view;

use anyhow::Context;
use std::path::PathBuf;
use videoflow_core::upload::IntakeLimits;
use videoflow_preview::headless::HeadlessSurface;

use crate::config::{PreviewBackend, ShellConfig};
use crate::editor::Editor;
use crate::surface::Surface;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = pico_args::Arguments::from_env();
    let mut config = ShellConfig::from_env();
    if args.contains("--headless") {
        config.preview = PreviewBackend::Headless;
    }
    if let Some(dir) = args.opt_value_from_str::<_, PathBuf>("--downloads")? {
        config.downloads_dir = dir;
    }
    let initial = args.finish().into_iter().next().map(PathBuf::from);

    tracing::info!(
        downloads = %config.downloads_dir.display(),
        preview = ?config.preview,
        "Starting VideoFlow"
    );

    let limits = IntakeLimits {
        max_bytes: config.max_upload_bytes,
    };
    let editor = Editor::new(open_surface(config.preview), limits);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, app::run(config, editor, initial))
}

fn open_surface(backend: PreviewBackend) -> Surface {
    match backend {
        PreviewBackend::Headless => Surface::Headless(HeadlessSurface::new()),
        #[cfg(unix)]
        PreviewBackend::Mpv => match videoflow_preview::mpv::MpvSurface::launch() {
            Ok(mpv) => Surface::Mpv(mpv),
            Err(e) => {
                tracing::warn!(error = %e, "mpv unavailable, using headless preview");
                Surface::Headless(HeadlessSurface::new())
            }
        },
        #[cfg(not(unix))]
        PreviewBackend::Mpv => {
            tracing::warn!("mpv preview needs a unix socket, using headless preview");
            Surface::Headless(HeadlessSurface::new())
        }
    }
}

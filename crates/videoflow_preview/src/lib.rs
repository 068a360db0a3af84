pub mod error;
pub mod headless;
pub mod lease;
#[cfg(unix)]
pub mod mpv;
pub mod renderer;
pub mod style;
pub mod surface;

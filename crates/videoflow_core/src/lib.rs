pub mod arbiter;
pub mod error;
pub mod export;
pub mod format;
pub mod notify;
pub mod panel;
pub mod session;
pub mod timeline;
pub mod types;
pub mod upload;

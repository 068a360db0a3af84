pub mod download;
pub mod error;
pub mod export;
pub mod intake;
pub mod mime;
pub mod probe;

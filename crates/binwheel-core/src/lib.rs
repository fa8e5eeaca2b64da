//! Core library for binwheel - release resolution, artifact caching,
//! archive extraction, wheel assembly, and index upload.

pub mod cache;
pub mod content;
pub mod extract;
pub mod release;
pub mod upload;
pub mod wheel;

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("binwheel/", env!("CARGO_PKG_VERSION"));

//! Shared types for binwheel: the platform table, name/version newtypes,
//! and the content digests used by the wheel manifest and the upload
//! transport.

pub mod digest;
pub mod platform;
pub mod types;

pub use digest::{RecordDigest, UploadDigests};
pub use platform::{ArchiveFormat, Platform};
pub use types::{PackageName, Version};

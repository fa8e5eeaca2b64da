//! Content digests for the wheel manifest and the upload transport.
//!
//! Two distinct digest forms exist because they serve different consumers:
//! installers verify the manifest digest inside the wheel, while the upload
//! endpoint requires a legacy MD5/SHA-256 hex pair alongside the file.

use base64::Engine;
use sha2::{Digest, Sha256};

/// A manifest-format content digest: `sha256=<base64url, unpadded>`.
///
/// This is the digest form installers verify; it never leaves the wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDigest(String);

impl RecordDigest {
    /// Compute the digest of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let sum = Sha256::digest(data);
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(sum);
        Self(format!("sha256={encoded}"))
    }

    /// Return the digest string, including the algorithm prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RecordDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The digest pair the upload transport requires alongside a file.
///
/// The MD5 field is a legacy requirement of the endpoint; it is never used
/// for integrity decisions on this side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDigests {
    /// Hex-encoded MD5 of the file bytes.
    pub md5: String,
    /// Hex-encoded SHA-256 of the file bytes.
    pub sha256: String,
}

impl UploadDigests {
    /// Compute both digests of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let md5 = format!("{:x}", md5::compute(data));
        let sha256 = hex::encode(Sha256::digest(data));
        Self { md5, sha256 }
    }
}

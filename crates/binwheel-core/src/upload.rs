//! Wheel submission to a package index over the legacy multipart upload
//! endpoint.
//!
//! A duplicate submission is not a failure: the index answers 400 with a
//! recognizable body, and scheduled re-runs must treat that as success.

use std::path::Path;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use binwheel_schema::UploadDigests;

/// Production upload endpoint.
pub const DEFAULT_REPOSITORY_URL: &str = "https://upload.pypi.org/legacy/";

/// Staging upload endpoint, for verifying a release before publishing.
pub const TEST_REPOSITORY_URL: &str = "https://test.pypi.org/legacy/";

/// Errors from a wheel submission. Per-platform: a failed upload leaves the
/// built wheel on disk and the run continues with the next platform.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading the wheel from disk failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The index rejected the submission; carries its response verbatim.
    #[error("upload rejected with {status}: {body}")]
    Rejected {
        /// HTTP status the index returned.
        status: reqwest::StatusCode,
        /// Response body, verbatim.
        body: String,
    },
}

/// How the index answered a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The file was accepted and stored.
    Uploaded,
    /// The exact file is already present; a re-run, not a failure.
    AlreadyExists,
}

/// Addressing and credentials for one submission.
#[derive(Debug)]
pub struct UploadRequest<'a> {
    /// Path of the finished wheel on disk.
    pub wheel_path: &'a Path,
    /// Package name as published.
    pub package: &'a str,
    /// Package version being uploaded.
    pub version: &'a str,
    /// Upload endpoint URL.
    pub endpoint: &'a str,
    /// Index username (`__token__` when using an API token).
    pub username: &'a str,
    /// Index password or API token.
    pub password: &'a str,
}

/// Submit one wheel to the index.
///
/// # Errors
///
/// Returns [`UploadError::Rejected`] with the index's status and body for
/// any response that is neither a success nor a recognized duplicate.
pub async fn upload_wheel(
    client: &Client,
    req: &UploadRequest<'_>,
) -> Result<UploadOutcome, UploadError> {
    let data = tokio::fs::read(req.wheel_path).await?;
    let digests = UploadDigests::compute(&data);
    let filename = req
        .wheel_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("package.whl")
        .to_string();

    let part = Part::bytes(data)
        .file_name(filename.clone())
        .mime_str("application/zip")?;

    let form = Form::new()
        .text(":action", "file_upload")
        .text("protocol_version", "1")
        .text("filetype", "bdist_wheel")
        .text("pyversion", "py3")
        .text("metadata_version", "2.4")
        .text("name", req.package.to_string())
        .text("version", req.version.to_string())
        .text("md5_digest", digests.md5)
        .text("sha2_digest", digests.sha256)
        .part("content", part);

    let resp = client
        .post(req.endpoint)
        .basic_auth(req.username, Some(req.password))
        .multipart(form)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if status.is_success() {
        return Ok(UploadOutcome::Uploaded);
    }

    // Duplicate detection is keyed to this endpoint's observed responses:
    // a 400 whose body names the existing file.
    if status == reqwest::StatusCode::BAD_REQUEST
        && (body.contains("already exists") || body.contains("File already"))
    {
        tracing::warn!("{filename} already exists on the index, skipping");
        return Ok(UploadOutcome::AlreadyExists);
    }

    Err(UploadError::Rejected { status, body })
}

//! License and description resolution for wheel metadata.
//!
//! Both are resolved once, before any per-platform work, so a missing file
//! fails the run early instead of after the first download.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;

/// Read the license text from `path` when given, otherwise fetch it from
/// the upstream project's published license URL.
pub async fn load_license(
    client: &Client,
    path: Option<&Path>,
    fallback_url: &str,
) -> Result<Vec<u8>> {
    if let Some(path) = path {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading license file {}", path.display()))?;
        tracing::debug!("using license from {}", path.display());
        return Ok(data);
    }

    tracing::debug!("fetching license from {fallback_url}");
    let resp = client
        .get(fallback_url)
        .send()
        .await
        .context("fetching license")?;
    if !resp.status().is_success() {
        anyhow::bail!("fetching license: {fallback_url} returned {}", resp.status());
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Read the long-form package description (markdown) from disk.
pub async fn load_description(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading description file {}", path.display()))
}

//! Read-through artifact cache keyed by URL basename.
//!
//! Callers partition the cache directory per upstream release version so
//! same-named assets from different releases can never collide.

use std::path::Path;

use reqwest::Client;
use thiserror::Error;

/// Errors while fetching an artifact through the cache. Per-platform
/// failures: the caller skips the platform and continues.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level download failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The origin answered with a non-success status.
    #[error("download {url} returned {status}")]
    Status {
        /// The request URL.
        url: String,
        /// The HTTP status the origin returned.
        status: reqwest::StatusCode,
    },

    /// Local filesystem failure (cache directory creation or read).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

async fn download_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Status {
            status: resp.status(),
            url: url.to_string(),
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Fetch `url`, serving from `cache_dir` when possible.
///
/// With no cache directory every call is a live fetch. Otherwise the cache
/// file is named after the URL's final path segment: a readable cache file
/// is returned as-is; on a miss the bytes are fetched and then written
/// best-effort (a failed write is logged and the fetched bytes are still
/// returned).
pub async fn fetch_cached(
    client: &Client,
    url: &str,
    cache_dir: Option<&Path>,
) -> Result<Vec<u8>, FetchError> {
    let Some(dir) = cache_dir else {
        tracing::debug!("downloading {url} (caching disabled)");
        return download_bytes(client, url).await;
    };

    let filename = url.rsplit('/').next().unwrap_or(url);
    tokio::fs::create_dir_all(dir).await?;

    let cache_path = dir.join(filename);
    if let Ok(data) = tokio::fs::read(&cache_path).await {
        tracing::debug!("cache hit for {filename}");
        return Ok(data);
    }

    tracing::debug!("cache miss, downloading {url}");
    let data = download_bytes(client, url).await?;
    if let Err(e) = tokio::fs::write(&cache_path, &data).await {
        tracing::warn!("could not write cache file {}: {e}", cache_path.display());
    }
    Ok(data)
}

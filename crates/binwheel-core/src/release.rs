//! Release discovery against a GitHub-style release index.
//!
//! A release is fetched once per run, either by exact tag or as the most
//! recent one, and its assets are indexed by exact filename so per-platform
//! resolution is a map lookup.

use std::collections::HashMap;

use anyhow::Result;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use thiserror::Error;

use binwheel_schema::{Platform, Version};

/// Errors from the release index. Any of these is fatal for the run: with
/// no release metadata there is nothing downstream to build.
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Transport-level failure talking to the index.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The index answered with a non-success status.
    #[error("release index {url} returned {status}")]
    Status {
        /// The request URL, for actionable error output.
        url: String,
        /// The HTTP status the index returned.
        status: reqwest::StatusCode,
    },
}

/// A published release: its tag plus the downloadable assets, indexed by
/// exact filename.
#[derive(Debug, Clone)]
pub struct Release {
    /// The release tag as published (e.g. `v1.4.2`).
    pub tag: String,
    assets: Vec<Asset>,
    by_name: HashMap<String, usize>,
}

/// One downloadable artifact attached to a release.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Asset filename as published.
    pub name: String,
    /// Direct download URL.
    pub url: String,
}

impl Release {
    /// Build a release from its tag and asset list, indexing assets by name.
    pub fn new(tag: String, assets: Vec<Asset>) -> Self {
        let by_name = assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();
        Self { tag, assets, by_name }
    }

    /// The assets in publication order.
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Download URL for an asset with this exact filename.
    pub fn asset_url(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(|&i| self.assets[i].url.as_str())
    }
}

#[derive(Deserialize)]
struct WireRelease {
    tag_name: String,
    assets: Vec<WireAsset>,
}

#[derive(Deserialize)]
struct WireAsset {
    name: String,
    browser_download_url: String,
}

/// Build the HTTP client used for all index and download traffic.
///
/// Sends the JSON accept header the release API expects and, when a token
/// is given, a bearer authorization header (avoids API rate limits).
pub fn build_client(token: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    let client = Client::builder()
        .user_agent(crate::USER_AGENT)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Fetch a release by exact tag, or the most recent one when `tag` is
/// `None` or empty.
///
/// # Errors
///
/// Returns [`ReleaseError::Status`] when the index answers with a
/// non-success status, [`ReleaseError::Http`] on transport failures.
pub async fn fetch_release(
    client: &Client,
    api_base: &str,
    repo: &str,
    tag: Option<&str>,
) -> Result<Release, ReleaseError> {
    let url = match tag {
        Some(t) if !t.is_empty() => format!("{api_base}/repos/{repo}/releases/tags/{t}"),
        _ => format!("{api_base}/repos/{repo}/releases/latest"),
    };

    tracing::debug!("fetching release metadata from {url}");
    let resp = client.get(&url).send().await?;
    if !resp.status().is_success() {
        return Err(ReleaseError::Status {
            status: resp.status(),
            url,
        });
    }

    let wire: WireRelease = resp.json().await?;
    let assets = wire
        .assets
        .into_iter()
        .map(|a| Asset {
            name: a.name,
            url: a.browser_download_url,
        })
        .collect();
    Ok(Release::new(wire.tag_name, assets))
}

/// Resolve the asset for one platform, trying the upstream's two naming
/// templates in order: `{binary}_{version}_{key}.{ext}`, then
/// `{binary}_{key}.{ext}`.
///
/// Returns the matched asset name and its URL, or `None` when neither
/// template matches; a miss is a per-platform skip, never an error.
pub fn resolve_asset<'r>(
    release: &'r Release,
    binary: &str,
    version: &Version,
    platform: &Platform,
) -> Option<(String, &'r str)> {
    let ext = platform.format.extension();

    let primary = format!("{binary}_{version}_{}.{ext}", platform.key);
    if let Some(url) = release.asset_url(&primary) {
        return Some((primary, url));
    }

    let fallback = format!("{binary}_{}.{ext}", platform.key);
    let url = release.asset_url(&fallback)?;
    Some((fallback, url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release_with(names: &[&str]) -> Release {
        let assets = names
            .iter()
            .map(|n| Asset {
                name: (*n).to_string(),
                url: format!("https://example.com/dl/{n}"),
            })
            .collect();
        Release::new("v1.4.2".to_string(), assets)
    }

    #[test]
    fn resolve_asset_prefers_versioned_template() {
        let release = release_with(&["neo4j-mcp_1.4.2_Linux_amd64.tar.gz"]);
        let platform = Platform::lookup("Linux_amd64").unwrap();
        let version = Version::new("1.4.2");

        let (name, url) = resolve_asset(&release, "neo4j-mcp", &version, platform).unwrap();
        assert_eq!(name, "neo4j-mcp_1.4.2_Linux_amd64.tar.gz");
        assert!(url.ends_with(&name));
    }

    #[test]
    fn resolve_asset_falls_back_to_unversioned_template() {
        let release = release_with(&["neo4j-mcp_Linux_amd64.tar.gz"]);
        let platform = Platform::lookup("Linux_amd64").unwrap();
        let version = Version::new("1.4.2");

        let (name, _) = resolve_asset(&release, "neo4j-mcp", &version, platform).unwrap();
        assert_eq!(name, "neo4j-mcp_Linux_amd64.tar.gz");
    }

    #[test]
    fn resolve_asset_misses_are_none() {
        let release = release_with(&["neo4j-mcp_1.4.2_Darwin_arm64.tar.gz"]);
        let platform = Platform::lookup("Linux_amd64").unwrap();
        let version = Version::new("1.4.2");

        assert!(resolve_asset(&release, "neo4j-mcp", &version, platform).is_none());
    }

    #[test]
    fn resolve_asset_uses_platform_extension() {
        let release = release_with(&["tool_2.0.0_Windows_amd64.zip"]);
        let platform = Platform::lookup("Windows_amd64").unwrap();
        let version = Version::new("2.0.0");

        let (name, _) = resolve_asset(&release, "tool", &version, platform).unwrap();
        assert!(name.ends_with(".zip"));
    }

    #[tokio::test]
    async fn fetch_release_by_tag() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "tag_name": "v1.0.0",
            "assets": [
                {"name": "tool_1.0.0_Linux_amd64.tar.gz",
                 "browser_download_url": "https://example.com/a.tar.gz"}
            ]
        });
        let mock = server
            .mock("GET", "/repos/acme/tool/releases/tags/v1.0.0")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = build_client(None).unwrap();
        let release = fetch_release(&client, &server.url(), "acme/tool", Some("v1.0.0"))
            .await
            .unwrap();

        assert_eq!(release.tag, "v1.0.0");
        assert_eq!(release.assets().len(), 1);
        assert_eq!(
            release.asset_url("tool_1.0.0_Linux_amd64.tar.gz"),
            Some("https://example.com/a.tar.gz")
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_release_latest_when_no_tag() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({"tag_name": "v2.1.0", "assets": []});
        let mock = server
            .mock("GET", "/repos/acme/tool/releases/latest")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = build_client(None).unwrap();
        let release = fetch_release(&client, &server.url(), "acme/tool", None)
            .await
            .unwrap();

        assert_eq!(release.tag, "v2.1.0");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_release_surfaces_index_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/tool/releases/tags/v9.9.9")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let client = build_client(None).unwrap();
        let err = fetch_release(&client, &server.url(), "acme/tool", Some("v9.9.9"))
            .await
            .unwrap_err();

        match err {
            ReleaseError::Status { status, url } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert!(url.contains("v9.9.9"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}

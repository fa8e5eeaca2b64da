//! binwheel - repackage upstream release binaries as Python wheels.
//!
//! Fetches a tagged (or latest) release, and for each requested platform
//! downloads the archive, extracts the binary, and wraps it in an
//! installable wheel. Wheels can optionally be uploaded to a package index.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use binwheel_core::{cache, content, extract, release, upload, wheel};
use binwheel_schema::{PackageName, Platform, Version};

#[derive(Parser)]
#[command(name = "binwheel")]
#[command(about = "Repackage upstream release binaries as Python wheels", long_about = None)]
struct Cli {
    /// Upstream repository in owner/repo format
    #[arg(long)]
    repo: String,

    /// Name of the released binary (asset prefix and in-archive filename)
    #[arg(long)]
    binary: String,

    /// Package name on the index (default: the binary name)
    #[arg(long)]
    package: Option<String>,

    /// Command name the wheel installs (default: the package name)
    #[arg(long)]
    entry_point: Option<String>,

    /// Upstream release tag, e.g. v1.4.2 (default: latest)
    #[arg(long, default_value = "")]
    version: String,

    /// Package version, e.g. 1.4.2.1 (default: mirrors the release version)
    #[arg(long)]
    py_version: Option<String>,

    /// Output directory for .whl files
    #[arg(short, long, default_value = "./dist")]
    output: PathBuf,

    /// Comma-separated platform keys (default: all)
    #[arg(long, default_value = "")]
    platforms: String,

    /// Upload built wheels to the package index
    #[arg(long)]
    upload: bool,

    /// Package index upload endpoint
    #[arg(long, default_value = upload::DEFAULT_REPOSITORY_URL)]
    repository_url: String,

    /// Index username (use __token__ for API tokens)
    #[arg(long, default_value = "__token__")]
    username: String,

    /// Path to a license file (default: fetch LICENSE.txt from the repo)
    #[arg(long)]
    license: Option<PathBuf>,

    /// Path to a Markdown description file
    #[arg(long, default_value = "DESCRIPTION.md")]
    description: PathBuf,

    /// Directory for cached downloads; pass an empty value to disable
    #[arg(long, value_parser = clap::builder::OsStringValueParser::new().map(PathBuf::from))]
    cache: Option<PathBuf>,

    /// SPDX license expression recorded in the wheel metadata
    #[arg(long, default_value = "MIT")]
    license_expression: String,

    /// Comma-separated keywords recorded in the wheel metadata
    #[arg(long)]
    keywords: Option<String>,

    /// Release index API base (override for self-hosted forges)
    #[arg(long, default_value = "https://api.github.com")]
    api_base: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let package = PackageName::new(cli.package.as_deref().unwrap_or(&cli.binary));
    let entry_point = cli
        .entry_point
        .clone()
        .unwrap_or_else(|| package.as_str().to_string());

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {}", cli.output.display()))?;

    // Resolve credentials before any network or file work so a bad
    // invocation fails immediately.
    let password = if cli.upload {
        let token = std::env::var("PYPI_TOKEN")
            .or_else(|_| std::env::var("PYPI_PASSWORD"))
            .ok();
        Some(token.context("--upload requires PYPI_TOKEN (or PYPI_PASSWORD)")?)
    } else {
        None
    };

    let github_token = std::env::var("GITHUB_TOKEN").ok();
    let client = release::build_client(github_token.as_deref())?;

    let license_url = format!(
        "https://raw.githubusercontent.com/{}/main/LICENSE.txt",
        cli.repo
    );
    let license = content::load_license(&client, cli.license.as_deref(), &license_url).await?;
    let description = content::load_description(&cli.description).await?;

    let platforms = select_platforms(&cli.platforms);

    let tag = (!cli.version.is_empty()).then_some(cli.version.as_str());
    let rel = release::fetch_release(&client, &cli.api_base, &cli.repo, tag)
        .await
        .context("fetching release")?;

    let binary_version = Version::from_tag(&rel.tag);
    let py_version = cli
        .py_version
        .as_deref()
        .map_or_else(|| binary_version.clone(), Version::new);

    println!("  release version : {binary_version}");
    println!("  package version : {py_version}");
    println!();

    let project = wheel::ProjectMeta {
        source_url: format!("https://github.com/{}", cli.repo),
        license_expression: cli.license_expression.clone(),
        keywords: cli
            .keywords
            .clone()
            .unwrap_or_else(|| package.as_str().to_string()),
        entry_point,
    };

    let cache_root = resolve_cache_root(cli.cache.as_deref());
    tracing::debug!("processing {} platform(s)", platforms.len());

    let mut built: Vec<PathBuf> = Vec::new();
    for platform in platforms {
        let Some((asset_name, url)) =
            release::resolve_asset(&rel, &cli.binary, &binary_version, platform)
        else {
            println!(
                "  skip {}: no release asset matching {}_{}_{}.{ext} or {}_{}.{ext}",
                platform.key,
                cli.binary,
                binary_version,
                platform.key,
                cli.binary,
                platform.key,
                ext = platform.format.extension(),
            );
            continue;
        };

        println!("  {} -> {}", platform.key, platform.wheel_tag);

        // Cache entries are partitioned per release version so same-named
        // assets from different releases cannot collide.
        let cache_dir = cache_root
            .as_ref()
            .map(|root| root.join(binary_version.as_str()));
        let archive = match cache::fetch_cached(&client, url, cache_dir.as_deref()).await {
            Ok(data) => data,
            Err(e) => {
                eprintln!("  error downloading {asset_name}: {e}");
                continue;
            }
        };

        let binary_filename = platform.binary_filename(&cli.binary);
        let binary = match extract::extract_binary(&archive, platform.format, &binary_filename) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("  error extracting from {asset_name}: {e}");
                continue;
            }
        };

        let spec = wheel::WheelSpec {
            binary: &binary,
            binary_filename: &binary_filename,
            binary_version: binary_version.as_str(),
            package: &package,
            version: &py_version,
            wheel_tag: platform.wheel_tag,
            license: &license,
            description: &description,
            project: &project,
        };
        let path = match spec.build(&cli.output) {
            Ok(path) => path,
            Err(e) => {
                eprintln!("  error building wheel for {}: {e}", platform.key);
                continue;
            }
        };
        println!("    built {}", display_name(&path));

        if let Some(password) = &password {
            let req = upload::UploadRequest {
                wheel_path: &path,
                package: package.as_str(),
                version: py_version.as_str(),
                endpoint: &cli.repository_url,
                username: &cli.username,
                password,
            };
            match upload::upload_wheel(&client, &req).await {
                Ok(upload::UploadOutcome::Uploaded) => println!("    uploaded"),
                Ok(upload::UploadOutcome::AlreadyExists) => {
                    println!("    already on the index, skipped");
                }
                Err(e) => {
                    eprintln!("  error uploading {}: {e}", display_name(&path));
                    continue;
                }
            }
        }

        built.push(path);
    }

    println!();
    println!("  built {} wheel(s) in {}", built.len(), cli.output.display());
    for path in &built {
        println!("    {}", display_name(path));
    }
    Ok(())
}

/// Resolve the requested platform set against the closed registry.
/// Unknown keys are reported and skipped, never fatal.
fn select_platforms(flag: &str) -> Vec<&'static Platform> {
    if flag.is_empty() {
        return Platform::all().iter().collect();
    }

    let requested: HashSet<&str> = flag
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect();

    for key in &requested {
        if Platform::lookup(key).is_none() {
            println!("  skip {key}: unknown platform");
        }
    }

    Platform::all()
        .iter()
        .filter(|p| requested.contains(p.key))
        .collect()
}

/// Default cache root: the OS cache directory, a local fallback when the
/// OS location cannot be determined, or `None` when explicitly disabled
/// with an empty value.
fn resolve_cache_root(flag: Option<&Path>) -> Option<PathBuf> {
    match flag {
        Some(path) if path.as_os_str().is_empty() => None,
        Some(path) => Some(path.to_path_buf()),
        None => dirs::cache_dir()
            .map(|dir| dir.join("binwheel"))
            .or_else(|| Some(PathBuf::from(".cache"))),
    }
}

fn display_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

//! The closed table of supported release platforms.
//!
//! Maps an upstream platform key (as it appears in release asset filenames)
//! to the wheel platform tag it publishes under and the archive layout the
//! upstream release ships for it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Container format of an upstream release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// Gzip-compressed tar archive (`.tar.gz`).
    #[serde(rename = "tar.gz")]
    TarGz,
    /// Zip archive (`.zip`).
    Zip,
}

impl ArchiveFormat {
    /// File extension used in upstream asset names.
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error returned when parsing an unrecognized archive format name.
#[derive(Error, Debug)]
#[error("unknown archive format: {0}")]
pub struct FormatError(String);

impl FromStr for ArchiveFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            "zip" => Ok(ArchiveFormat::Zip),
            other => Err(FormatError(other.to_string())),
        }
    }
}

/// One supported target: an upstream platform key together with the wheel
/// tag and archive layout used when repackaging it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Upstream platform key as it appears in asset filenames
    /// (e.g. `Linux_amd64`).
    pub key: &'static str,
    /// Wheel platform tag the repackaged binary is published under.
    pub wheel_tag: &'static str,
    /// Archive format the upstream release uses for this platform.
    pub format: ArchiveFormat,
    /// Whether this platform needs Windows launcher semantics and an
    /// `.exe` binary suffix.
    pub windows: bool,
}

/// Every platform this tool knows how to repackage. A closed set: callers
/// skip unknown keys, they never error on them.
const PLATFORMS: &[Platform] = &[
    Platform {
        key: "Darwin_amd64",
        wheel_tag: "macosx_10_9_x86_64",
        format: ArchiveFormat::TarGz,
        windows: false,
    },
    Platform {
        key: "Darwin_arm64",
        wheel_tag: "macosx_11_0_arm64",
        format: ArchiveFormat::TarGz,
        windows: false,
    },
    Platform {
        key: "Linux_amd64",
        wheel_tag: "manylinux_2_17_x86_64",
        format: ArchiveFormat::TarGz,
        windows: false,
    },
    Platform {
        key: "Linux_arm64",
        wheel_tag: "manylinux_2_17_aarch64",
        format: ArchiveFormat::TarGz,
        windows: false,
    },
    Platform {
        key: "Windows_amd64",
        wheel_tag: "win_amd64",
        format: ArchiveFormat::Zip,
        windows: true,
    },
    Platform {
        key: "Windows_arm64",
        wheel_tag: "win_arm64",
        format: ArchiveFormat::Zip,
        windows: true,
    },
];

impl Platform {
    /// The full table, in publication order.
    pub fn all() -> &'static [Platform] {
        PLATFORMS
    }

    /// Look up a platform by its upstream key.
    ///
    /// Unknown keys return `None`; callers treat that as a skip.
    pub fn lookup(key: &str) -> Option<&'static Platform> {
        PLATFORMS.iter().find(|p| p.key == key)
    }

    /// Name of the binary inside the upstream archive (`.exe` on Windows).
    pub fn binary_filename(&self, base: &str) -> String {
        if self.windows {
            format!("{base}.exe")
        } else {
            base.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_key() {
        let p = Platform::lookup("Linux_amd64").unwrap();
        assert_eq!(p.wheel_tag, "manylinux_2_17_x86_64");
        assert_eq!(p.format, ArchiveFormat::TarGz);
        assert!(!p.windows);
    }

    #[test]
    fn lookup_unknown_key_is_none() {
        assert!(Platform::lookup("Plan9_amd64").is_none());
        assert!(Platform::lookup("").is_none());
    }

    #[test]
    fn windows_binary_gets_exe_suffix() {
        let win = Platform::lookup("Windows_arm64").unwrap();
        assert_eq!(win.binary_filename("tool"), "tool.exe");

        let linux = Platform::lookup("Linux_arm64").unwrap();
        assert_eq!(linux.binary_filename("tool"), "tool");
    }

    #[test]
    fn archive_format_parses_known_extensions() {
        assert_eq!("tar.gz".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::TarGz);
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert!("rar".parse::<ArchiveFormat>().is_err());
    }
}

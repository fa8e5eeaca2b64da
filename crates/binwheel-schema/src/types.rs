//! Name and version newtypes shared across the pipeline.

use serde::{Deserialize, Serialize};

/// A package name as published on the index.
///
/// Stored verbatim. [`PackageName::normalized`] yields the
/// filesystem/identifier-safe form used for directories inside the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Return the published name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The module-safe form of the name: the reserved `-` separator is
    /// replaced with `_`, as required for directory names inside the wheel.
    pub fn normalized(&self) -> String {
        self.0.replace('-', "_")
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A version string, stored without the conventional leading `v`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(String);

impl Version {
    /// Create a version from the given string (stored as-is).
    pub fn new(v: &str) -> Self {
        Self(v.to_string())
    }

    /// Build a version from a release tag, trimming one leading `v` if
    /// present (`v1.4.2` and `1.4.2` both become `1.4.2`).
    pub fn from_tag(tag: &str) -> Self {
        Self(tag.strip_prefix('v').unwrap_or(tag).to_string())
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_replaces_hyphens() {
        let name = PackageName::new("acme-tool-cli");
        assert_eq!(name.as_str(), "acme-tool-cli");
        assert_eq!(name.normalized(), "acme_tool_cli");
    }

    #[test]
    fn version_from_tag_strips_single_prefix() {
        assert_eq!(Version::from_tag("v1.4.2").as_str(), "1.4.2");
        assert_eq!(Version::from_tag("1.4.2").as_str(), "1.4.2");
        // Only the conventional single prefix is trimmed.
        assert_eq!(Version::from_tag("vv2").as_str(), "v2");
    }
}

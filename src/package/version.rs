// src/package/version.rs

//! Package versions as they appear in package file names
//!
//! Two version kinds exist: semantic versions (lenient, one to four numeric
//! parts with optional pre-release and build metadata) and Maven-style
//! versions, which are opaque strings. Both keep the original text verbatim
//! so a version survives an encode/decode round trip unchanged.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Version grammar shared by cached and legacy dotted file names
pub(crate) const SEMVER_PATTERN: &str = r"\d+(?:\.\d+){0,3}(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?";

static SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{}$", SEMVER_PATTERN)).unwrap());

/// Discriminates how a version string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFormat {
    Semver,
    Maven,
}

impl VersionFormat {
    /// One-letter prefix used in cached file names
    pub fn prefix(&self) -> char {
        match self {
            Self::Semver => 'S',
            Self::Maven => 'M',
        }
    }

    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'S' => Some(Self::Semver),
            'M' => Some(Self::Maven),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Semver => "semver",
            Self::Maven => "maven",
        }
    }
}

/// A validated package version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackageVersion {
    Semver(String),
    Maven(String),
}

impl PackageVersion {
    /// Parse a semantic version, rejecting anything outside the grammar
    ///
    /// # Examples
    ///
    /// ```
    /// use outpost::package::PackageVersion;
    ///
    /// assert!(PackageVersion::semver("1.0.0-beta.1+build.5").is_ok());
    /// assert!(PackageVersion::semver("1.x").is_err());
    /// ```
    pub fn semver(text: &str) -> Result<Self> {
        if SEMVER.is_match(text) {
            Ok(Self::Semver(text.to_string()))
        } else {
            Err(Error::format(
                text,
                "the version is not a valid semantic version",
            ))
        }
    }

    /// Parse a Maven-style version; any non-empty text without whitespace
    pub fn maven(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(Error::format(text, "the Maven version is empty"));
        }
        if text.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::format(
                text,
                "the Maven version contains whitespace or control characters",
            ));
        }
        Ok(Self::Maven(text.to_string()))
    }

    /// Parse a version of the given format
    pub fn parse(format: VersionFormat, text: &str) -> Result<Self> {
        match format {
            VersionFormat::Semver => Self::semver(text),
            VersionFormat::Maven => Self::maven(text),
        }
    }

    pub fn format(&self) -> VersionFormat {
        match self {
            Self::Semver(_) => VersionFormat::Semver,
            Self::Maven(_) => VersionFormat::Maven,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Semver(v) | Self::Maven(v) => v,
        }
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

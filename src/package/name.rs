// src/package/name.rs

//! Package identity codec
//!
//! Packages downloaded into the local cache are stored under a name that
//! encodes the full identity:
//!
//! ```text
//! escape(id) @ {S|M}escape(version) @ {32 hex random}{extension}
//! ```
//!
//! The random segment only keeps repeated downloads of the same identity from
//! colliding. It carries no meaning and is ignored on decode.
//!
//! Packages that arrive from elsewhere usually use the conventional dotted
//! layout `id.version.ext`; [`from_file`] accepts both shapes.

use super::escape::{escape, escape_with, unescape};
use super::version::{PackageVersion, SEMVER_PATTERN, VersionFormat};
use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

const SECTION_DELIMITER: char = '@';

/// Characters escaped in Maven versions on top of the reserved set
const MAVEN_EXTRA_ESCAPES: [char; 1] = ['@'];

static TAR_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<name>.*)(?P<ext>\.tar(?:\.[a-z0-9]+)?)$").unwrap()
});

const DOTTED_ID_PATTERN: &str = r"(?P<id>\w+(?:[_.-]\w+)*?)";

static DOTTED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^{}\.(?P<version>{})(?P<ext>(?:\.[a-z0-9]+)+)$",
        DOTTED_ID_PATTERN, SEMVER_PATTERN
    ))
    .unwrap()
});

/// Dotted name whose tar extension has already been stripped
static DOTTED_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^{}\.(?P<version>{})$",
        DOTTED_ID_PATTERN, SEMVER_PATTERN
    ))
    .unwrap()
});

/// The (id, version, extension) triple naming a deployable artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    pub id: String,
    pub version: PackageVersion,
    /// Extension including the leading dot, e.g. `.tar.gz`
    pub extension: String,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: PackageVersion, extension: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version,
            extension: extension.into(),
        }
    }

    /// Encode this identity as a cached file name
    pub fn to_cached_file_name(&self) -> Result<String> {
        to_cached_file_name(&self.id, &self.version, &self.extension)
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// Encode a package identity into a collision-free cache file name
///
/// # Examples
///
/// ```
/// use outpost::package::{name, PackageVersion};
///
/// let version = PackageVersion::semver("1.0.1+beta").unwrap();
/// let cached = name::to_cached_file_name("feeds/Acme.Web", &version, ".zip").unwrap();
/// assert!(cached.starts_with("feeds%2FAcme.Web@S1.0.1+beta@"));
/// assert!(cached.ends_with(".zip"));
/// ```
pub fn to_cached_file_name(id: &str, version: &PackageVersion, extension: &str) -> Result<String> {
    if id.is_empty() {
        return Err(Error::format(id, "the package id is empty"));
    }
    if id.contains(SECTION_DELIMITER) {
        return Err(Error::format(
            id,
            "package ids containing '@' cannot be encoded unambiguously",
        ));
    }
    validate_extension(id, extension)?;

    let cache_buster = uuid::Uuid::new_v4().simple().to_string().to_uppercase();

    Ok(format!(
        "{}{delim}{}{}{delim}{}{}",
        escape(id),
        version.format().prefix(),
        encode_version(version),
        cache_buster,
        extension,
        delim = SECTION_DELIMITER,
    ))
}

fn encode_version(version: &PackageVersion) -> String {
    match version {
        PackageVersion::Semver(v) => escape(v),
        PackageVersion::Maven(v) => escape_with(v, &MAVEN_EXTRA_ESCAPES),
    }
}

fn validate_extension(id: &str, extension: &str) -> Result<()> {
    let valid = extension.len() > 1
        && extension.starts_with('.')
        && !extension.contains(['@', '/', '\\']);
    if valid {
        Ok(())
    } else {
        Err(Error::format(
            id,
            format!("'{}' is not a valid package file extension", extension),
        ))
    }
}

/// Build a glob pattern matching cached copies of a package
///
/// Missing parts match anything.
pub fn to_search_pattern(id: &str, version: Option<&PackageVersion>, extension: Option<&str>) -> String {
    let version = match version {
        Some(v) => glob::Pattern::escape(&format!("{}{}", v.format().prefix(), encode_version(v))),
        None => "*".to_string(),
    };
    let extension = extension.map_or_else(|| "*".to_string(), glob::Pattern::escape);
    format!("{}@{}@*{}", glob::Pattern::escape(&escape(id)), version, extension)
}

/// Decode the identity of a package from its file path
///
/// Accepts both the cached `@` layout and the dotted `id.version.ext` layout.
pub fn from_file(path: impl AsRef<Path>) -> Result<PackageIdentity> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::format(path.display().to_string(), "the path has no file name"))?;

    match file_name.matches(SECTION_DELIMITER).count() {
        0 => parse_dotted(file_name),
        2 => parse_cached(file_name),
        _ => Err(Error::format(
            file_name,
            "expected exactly three '@'-separated sections",
        )),
    }
}

/// Like [`from_file`], discarding the reason for failure
pub fn try_from_file(path: impl AsRef<Path>) -> Option<PackageIdentity> {
    from_file(path).ok()
}

fn parse_cached(file_name: &str) -> Result<PackageIdentity> {
    let mut sections = file_name.split(SECTION_DELIMITER);
    let (Some(id_section), Some(version_section), Some(tail)) =
        (sections.next(), sections.next(), sections.next())
    else {
        return Err(Error::format(file_name, "missing '@'-separated sections"));
    };

    let id = unescape(id_section);
    if id.is_empty() {
        return Err(Error::format(file_name, "the package id is empty"));
    }

    let mut version_chars = version_section.chars();
    let prefix = version_chars
        .next()
        .ok_or_else(|| Error::format(file_name, "the version section is empty"))?;
    let format = VersionFormat::from_prefix(prefix).ok_or_else(|| {
        Error::format(
            file_name,
            format!("unknown version type prefix '{}'", prefix),
        )
    })?;
    let version = PackageVersion::parse(format, &unescape(version_chars.as_str()))
        .map_err(|e| Error::format(file_name, e.to_string()))?;

    let dot = tail
        .find('.')
        .ok_or_else(|| Error::format(file_name, "the file name has no extension"))?;

    Ok(PackageIdentity {
        id,
        version,
        extension: tail[dot..].to_string(),
    })
}

fn parse_dotted(file_name: &str) -> Result<PackageIdentity> {
    let failure = || {
        Error::format(
            file_name,
            "expected either <id>.<version>.<extension> or <id>@<version>@<random><extension>",
        )
    };

    let (caps, extension) = match TAR_EXTENSION.captures(file_name) {
        Some(tar) => {
            let stem = tar.name("name").map_or("", |m| m.as_str());
            let caps = DOTTED_STEM.captures(stem).ok_or_else(failure)?;
            (caps, tar["ext"].to_string())
        }
        None => {
            let caps = DOTTED_NAME.captures(file_name).ok_or_else(failure)?;
            let extension = caps["ext"].to_string();
            (caps, extension)
        }
    };

    Ok(PackageIdentity {
        id: caps["id"].to_string(),
        version: PackageVersion::semver(&caps["version"])?,
        extension,
    })
}

/// Take the final segment of a feed-pathed id such as `folder/sub/Acme.Web`
///
/// # Examples
///
/// ```
/// use outpost::package::name::extract_package_name_from_pathed_id;
///
/// assert_eq!(extract_package_name_from_pathed_id("folder/sub/Acme.Web"), "Acme.Web");
/// assert_eq!(extract_package_name_from_pathed_id(""), "");
/// ```
pub fn extract_package_name_from_pathed_id(pathed_id: &str) -> &str {
    pathed_id
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semver(v: &str) -> PackageVersion {
        PackageVersion::semver(v).unwrap()
    }

    #[test]
    fn test_cached_round_trip_semver() {
        let cases = [
            ("Acme.Web", "1.0.0", ".zip"),
            ("feeds/nested/Acme.Web", "1.0.1+beta", ".tar.gz"),
            ("Acme", "2.0.0-rc.1+build.7", ".nupkg"),
            ("odd:name|with?chars", "1", ".tar"),
        ];
        for (id, version, ext) in cases {
            let encoded = to_cached_file_name(id, &semver(version), ext).unwrap();
            let decoded = from_file(&encoded).unwrap();
            assert_eq!(decoded.id, id);
            assert_eq!(decoded.version, semver(version));
            assert_eq!(decoded.extension, ext);
        }
    }

    #[test]
    fn test_cached_round_trip_maven() {
        let version = PackageVersion::maven("1.0-SNAPSHOT@2:linux").unwrap();
        let encoded = to_cached_file_name("com.acme:app", &version, ".jar").unwrap();
        let decoded = from_file(&encoded).unwrap();
        assert_eq!(decoded.id, "com.acme:app");
        assert_eq!(decoded.version, version);
        assert_eq!(decoded.extension, ".jar");
    }

    #[test]
    fn test_cache_buster_is_random_uppercase_hex() {
        let version = semver("1.0.0");
        let a = to_cached_file_name("Acme", &version, ".zip").unwrap();
        let b = to_cached_file_name("Acme", &version, ".zip").unwrap();
        assert_ne!(a, b);

        let buster = a.rsplit('@').next().unwrap().trim_end_matches(".zip");
        assert_eq!(buster.len(), 32);
        assert!(buster.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_decode_ignores_disambiguator_content() {
        let decoded = from_file("Acme@S1.2.3@anything-at-all.zip").unwrap();
        assert_eq!(decoded.id, "Acme");
        assert_eq!(decoded.version, semver("1.2.3"));
        assert_eq!(decoded.extension, ".zip");
    }

    #[test]
    fn test_decode_rejects_unknown_prefix_and_bad_versions() {
        assert!(matches!(
            from_file("Acme@X1.0.0@ABC.zip"),
            Err(Error::Format { .. })
        ));
        assert!(from_file("Acme@Sone.two@ABC.zip").is_err());
        assert!(from_file("Acme@S1.0.0@NOEXTENSION").is_err());
    }

    #[test]
    fn test_ids_with_at_are_rejected() {
        assert!(to_cached_file_name("user@host", &semver("1.0.0"), ".zip").is_err());
        assert!(from_file("user@host@S1.0.0@ABC.zip").is_err());
        assert!(from_file("Acme@S1.0.0.zip").is_err());
    }

    #[test]
    fn test_encode_validates_extension() {
        assert!(to_cached_file_name("Acme", &semver("1.0.0"), "zip").is_err());
        assert!(to_cached_file_name("Acme", &semver("1.0.0"), ".").is_err());
    }

    #[test]
    fn test_dotted_form() {
        let decoded = from_file("/var/cache/Acme.Web.1.0.0.zip").unwrap();
        assert_eq!(decoded.id, "Acme.Web");
        assert_eq!(decoded.version, semver("1.0.0"));
        assert_eq!(decoded.extension, ".zip");

        let decoded = from_file("Acme.Web.2.1.0-beta.nupkg").unwrap();
        assert_eq!(decoded.id, "Acme.Web");
        assert_eq!(decoded.version, semver("2.1.0-beta"));
        assert_eq!(decoded.extension, ".nupkg");
    }

    #[test]
    fn test_dotted_form_tar_extensions() {
        let decoded = from_file("foo.1.0.0.tar.gz").unwrap();
        assert_eq!(decoded.id, "foo");
        assert_eq!(decoded.version, semver("1.0.0"));
        assert_eq!(decoded.extension, ".tar.gz");

        let decoded = from_file("Acme.Core.1.2.tar").unwrap();
        assert_eq!(decoded.id, "Acme.Core");
        assert_eq!(decoded.version, semver("1.2"));
        assert_eq!(decoded.extension, ".tar");
    }

    #[test]
    fn test_dotted_form_shortest_version_suffix() {
        let decoded = from_file("foo.1.0.0.7z").unwrap();
        assert_eq!(decoded.version, semver("1.0.0"));
        assert_eq!(decoded.extension, ".7z");
    }

    #[test]
    fn test_dotted_form_failures() {
        assert!(from_file("blah").is_err());
        assert!(from_file("Acme.Web.zip").is_err());
        assert!(from_file("Acme.1.0.0").is_err());
    }

    #[test]
    fn test_search_pattern() {
        let pattern = to_search_pattern("Acme/Web", Some(&semver("1.0.0")), Some(".zip"));
        assert_eq!(pattern, "Acme%2FWeb@S1.0.0@*.zip");
        assert_eq!(to_search_pattern("Acme", None, None), "Acme@*@**");

        let encoded = to_cached_file_name("Acme/Web", &semver("1.0.0"), ".zip").unwrap();
        assert!(glob::Pattern::new(&pattern).unwrap().matches(&encoded));
    }

    #[test]
    fn test_extract_package_name_from_pathed_id() {
        assert_eq!(extract_package_name_from_pathed_id("Acme.Web"), "Acme.Web");
        assert_eq!(extract_package_name_from_pathed_id("a/b/Acme.Web"), "Acme.Web");
        assert_eq!(extract_package_name_from_pathed_id("a/b/"), "b");
        assert_eq!(extract_package_name_from_pathed_id(""), "");
    }
}

// src/filesystem/path.rs

//! Path handling for archive entries and installation directories
//!
//! Archive entry names come from untrusted packages and are sanitized before
//! they are joined onto an extraction directory. Installation directories come
//! from deployment variables and are checked for being rooted and for not
//! nesting inside the staging directory.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Sanitize an archive entry name into a relative path
///
/// Backslashes are treated as separators (zip files written on Windows use
/// them), leading separators are stripped, `.` components are skipped and any
/// `..` component is rejected.
///
/// # Examples
///
/// ```
/// use outpost::filesystem::path::sanitize_entry_name;
/// use std::path::PathBuf;
///
/// assert_eq!(sanitize_entry_name("bin/app.dll").unwrap(), PathBuf::from("bin/app.dll"));
/// assert_eq!(sanitize_entry_name("\\content\\site.css").unwrap(), PathBuf::from("content/site.css"));
/// assert!(sanitize_entry_name("../etc/passwd").is_err());
/// ```
pub fn sanitize_entry_name(name: &str) -> Result<PathBuf> {
    let unified = name.replace('\\', "/");
    let relative = unified.trim_start_matches('/');

    let mut normalized = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => return Err(Error::PathTraversal(name.to_string())),
            Component::Prefix(_) | Component::RootDir => {
                return Err(Error::PathTraversal(name.to_string()));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath(format!(
            "Archive entry '{}' is empty after sanitization",
            name
        )));
    }

    Ok(normalized)
}

/// Whether an archive entry names the extraction root itself
///
/// `tar -C dir .` writes a leading `./` directory entry; it maps onto the
/// target directory rather than to anything below it.
pub fn is_root_entry(name: &str) -> bool {
    name.split(['/', '\\'])
        .all(|component| component.is_empty() || component == ".")
}

/// Join an archive entry name onto an extraction root
///
/// The result is guaranteed to sit under `root`.
pub fn safe_join(root: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
    let root = root.as_ref();
    let joined = root.join(sanitize_entry_name(name)?);

    // Catches entries that resolve through an existing symlink
    if let (Ok(canonical_root), Ok(canonical_joined)) = (root.canonicalize(), joined.canonicalize())
        && !canonical_joined.starts_with(&canonical_root)
    {
        return Err(Error::PathTraversal(format!(
            "Path {} escapes root {}",
            joined.display(),
            root.display()
        )));
    }

    Ok(joined)
}

/// Whether a directory value names an absolute or network location
///
/// Host-absolute paths, UNC paths (`\\server\share`, `//server/share`) and
/// drive-rooted Windows paths (`C:\Apps`) are all accepted regardless of the
/// platform the agent runs on.
pub fn is_rooted(path: &str) -> bool {
    if Path::new(path).is_absolute() || path.starts_with("\\\\") || path.starts_with("//") {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

/// Lexically normalize a path, folding `.` and `..` components
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Whether `candidate` is `parent` itself or lies beneath it
pub fn is_same_or_child_of(candidate: impl AsRef<Path>, parent: impl AsRef<Path>) -> bool {
    resolve(candidate.as_ref()).starts_with(resolve(parent.as_ref()))
}

/// Canonicalize the longest existing ancestor and re-append the rest
fn resolve(path: &Path) -> PathBuf {
    let normalized = normalize(path);
    let mut existing = normalized.as_path();
    let mut missing = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing.iter().rev().fold(canonical, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

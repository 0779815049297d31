// src/filesystem/mod.rs

//! Filesystem operations used by the conventions
//!
//! This module provides:
//! - Recursive directory copy with a copied-file count
//! - Directory purge that preserves glob-excluded content
//! - File-name cleanup for directory names derived from variables
//! - Entry-name sanitization for archive extraction (see [`path`])

pub mod path;

use crate::error::Result;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Characters that cannot appear in a file name on any supported host
const INVALID_FILE_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip characters that are invalid in a single file-name component
///
/// # Examples
///
/// ```
/// use outpost::filesystem::remove_invalid_file_name_chars;
///
/// assert_eq!(remove_invalid_file_name_chars("Production: EU/West"), "Production EUWest");
/// ```
pub fn remove_invalid_file_name_chars(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_FILE_NAME_CHARS.contains(c) && !c.is_control())
        .collect()
}

/// Recursively copy `source` into `target`, overwriting existing files
///
/// Returns the number of files copied. Empty directories are recreated.
pub fn copy_directory(source: &Path, target: &Path) -> Result<usize> {
    fs::create_dir_all(target)?;
    let mut copied = 0;

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| crate::Error::InvalidPath(entry.path().display().to_string()))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &destination)?;
            copied += 1;
        }
    }

    debug!("Copied {} files from {} to {}", copied, source.display(), target.display());
    Ok(copied)
}

/// Delete the contents of `target`, keeping anything matched by `exclusions`
///
/// Exclusions are glob patterns relative to `target`. A matched directory
/// keeps its whole subtree, and directories that still contain kept files
/// survive. Patterns that match nothing are reported as warnings.
pub fn purge_directory(target: &Path, exclusions: &[String]) -> Result<()> {
    if !target.is_dir() {
        return Ok(());
    }

    let kept = resolve_exclusions(target, exclusions);

    let mut entries = Vec::new();
    for entry in WalkDir::new(target).min_depth(1).contents_first(true) {
        entries.push(entry.map_err(std::io::Error::from)?);
    }

    for entry in entries {
        let path = entry.path();
        if kept.iter().any(|k| path.starts_with(k)) {
            continue;
        }

        if entry.file_type().is_dir() {
            if fs::read_dir(path)?.next().is_none() {
                fs::remove_dir(path)?;
            }
        } else {
            fs::remove_file(path)?;
        }
    }

    Ok(())
}

fn resolve_exclusions(target: &Path, exclusions: &[String]) -> HashSet<PathBuf> {
    let root = glob::Pattern::escape(&target.to_string_lossy());
    let mut kept = HashSet::new();

    for pattern in exclusions {
        let full = format!("{}/{}", root.trim_end_matches('/'), pattern.trim_start_matches(['/', '\\']));
        let matches: Vec<PathBuf> = match glob::glob(&full) {
            Ok(paths) => paths.filter_map(|p| p.ok()).collect(),
            Err(e) => {
                warn!("Ignoring invalid purge exclusion '{}': {}", pattern, e);
                continue;
            }
        };

        if matches.is_empty() {
            warn!("The purge exclusion '{}' did not match any files", pattern);
        }
        kept.extend(matches);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative.as_bytes()).unwrap();
    }

    #[test]
    fn test_remove_invalid_file_name_chars() {
        assert_eq!(remove_invalid_file_name_chars("Test"), "Test");
        assert_eq!(remove_invalid_file_name_chars("a<b>c|d?e*f"), "abcdef");
        assert_eq!(remove_invalid_file_name_chars("tab\there"), "tabhere");
    }

    #[test]
    fn test_copy_directory_counts_files() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        touch(source.path(), "a.txt");
        touch(source.path(), "sub/b.txt");
        touch(source.path(), "sub/deeper/c.txt");
        fs::create_dir_all(source.path().join("empty/nested")).unwrap();

        let copied = copy_directory(source.path(), &target.path().join("out")).unwrap();

        assert_eq!(copied, 3);
        assert!(target.path().join("out/sub/deeper/c.txt").is_file());
        assert!(target.path().join("out/empty/nested").is_dir());
    }

    #[test]
    fn test_copy_directory_overwrites() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(source.path().join("app.config"), "new").unwrap();
        fs::write(target.path().join("app.config"), "old").unwrap();

        copy_directory(source.path(), target.path()).unwrap();

        assert_eq!(fs::read_to_string(target.path().join("app.config")).unwrap(), "new");
    }

    #[test]
    fn test_purge_without_exclusions() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.txt");
        touch(dir.path(), "sub/b.txt");

        purge_directory(dir.path(), &[]).unwrap();

        assert!(dir.path().is_dir());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_purge_keeps_excluded_files_and_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.dll");
        touch(dir.path(), "web.config");
        touch(dir.path(), "logs/today.log");
        touch(dir.path(), "logs/archive/old.log");
        touch(dir.path(), "uploads/images/a.png");
        touch(dir.path(), "uploads/readme.txt");

        let exclusions = vec![
            "web.config".to_string(),
            "logs".to_string(),
            "uploads/**/*.png".to_string(),
            "missing/*.xml".to_string(),
        ];
        purge_directory(dir.path(), &exclusions).unwrap();

        assert!(!dir.path().join("app.dll").exists());
        assert!(dir.path().join("web.config").is_file());
        assert!(dir.path().join("logs/archive/old.log").is_file());
        assert!(dir.path().join("uploads/images/a.png").is_file());
        assert!(!dir.path().join("uploads/readme.txt").exists());
    }

    #[test]
    fn test_purge_missing_directory_is_noop() {
        let dir = TempDir::new().unwrap();
        purge_directory(&dir.path().join("nope"), &["*".to_string()]).unwrap();
    }
}

// src/placement/mod.rs

//! Application directory placement
//!
//! Every deployment gets its own directory under the application root:
//!
//! ```text
//! <root>/[<environment>/][<tenant>/]<package id>/<version>[_N]
//! ```
//!
//! The `_N` suffix is picked by probing under a cross-process
//! [`NamedSemaphore`], so two agents deploying the same version at the same
//! time never share a directory. Only check-and-create happens under the
//! semaphore; extraction runs after it is released.

pub mod semaphore;

pub use semaphore::{APPLICATION_DIRECTORY_LOCK, NamedSemaphore, SemaphoreGuard};

use crate::deployment::{VariableDictionary, known};
use crate::error::{Error, Result};
use crate::filesystem::remove_invalid_file_name_chars;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Computes the desired application directory for a package
pub struct ApplicationDirectory;

impl ApplicationDirectory {
    /// `<root>/[env]/[tenant]/<id>/<version>` for the deployment variables
    ///
    /// Environment fallbacks are read from `env:<NAME>` variables first, then
    /// from the process environment.
    pub fn resolve(variables: &VariableDictionary, package_id: &str, version: &str) -> Result<PathBuf> {
        Self::resolve_with(variables, package_id, version, |name| {
            variables
                .get_non_empty(&format!("env:{}", name))
                .or_else(|| std::env::var(name).ok())
        })
    }

    fn resolve_with(
        variables: &VariableDictionary,
        package_id: &str,
        version: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<PathBuf> {
        let mut path = Self::root(variables, env)?;

        for name in [known::environment::NAME, known::tenant::NAME] {
            if let Some(value) = variables.get_non_empty(name) {
                let segment = remove_invalid_file_name_chars(&value);
                if !segment.trim().is_empty() {
                    path.push(segment.trim());
                }
            }
        }

        path.push(remove_invalid_file_name_chars(package_id));
        path.push(remove_invalid_file_name_chars(version));
        Ok(path)
    }

    fn root(variables: &VariableDictionary, env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
        if let Some(root) = variables.get_path(known::agent::APPLICATION_DIRECTORY_PATH) {
            return Ok(root);
        }
        if let Some(drive) = env("SystemDrive").filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(format!("{}\\", drive)).join("Applications"));
        }
        if let Some(home) = env("HOME").filter(|h| !h.is_empty()) {
            return Ok(PathBuf::from(home).join("Applications"));
        }
        Err(Error::Command(format!(
            "Unable to determine the application directory root. Set the variable '{}'.",
            known::agent::APPLICATION_DIRECTORY_PATH
        )))
    }
}

/// Creates uniquely named directories under a named semaphore
#[derive(Debug, Clone)]
pub struct DirectoryPlacement {
    semaphore: NamedSemaphore,
    timeout: Duration,
}

impl DirectoryPlacement {
    pub fn new(semaphore: NamedSemaphore, timeout: Duration) -> Self {
        Self { semaphore, timeout }
    }

    /// Placement guarded by the well-known application directory semaphore
    pub fn for_applications(lock_dir: impl AsRef<Path>, timeout: Duration) -> Self {
        Self::new(NamedSemaphore::new(lock_dir, APPLICATION_DIRECTORY_LOCK), timeout)
    }

    /// Create `desired`, or `desired_1`, `desired_2`, ... if it is taken
    pub fn create_unique_directory(&self, desired: &Path) -> Result<PathBuf> {
        let _guard = self.semaphore.acquire(self.timeout)?;

        let mut candidate = desired.to_path_buf();
        let mut counter = 1usize;
        while candidate.exists() {
            candidate = suffixed(desired, counter)?;
            counter += 1;
        }

        fs::create_dir_all(&candidate)?;
        debug!("Created application directory {}", candidate.display());
        Ok(candidate)
    }
}

fn suffixed(path: &Path, counter: usize) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
    let mut name = name.to_os_string();
    name.push(format!("_{}", counter));
    Ok(path.with_file_name(name))
}

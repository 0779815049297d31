// src/placement/semaphore.rs

//! Cross-process named semaphore
//!
//! Backed by an exclusive `flock` on `<lock_dir>/<name>.lock`. Every
//! [`NamedSemaphore::acquire`] opens its own file handle, so threads of the
//! same process exclude each other as well as other agent processes.
//!
//! ```ignore
//! let semaphore = NamedSemaphore::new(&lock_dir, APPLICATION_DIRECTORY_LOCK);
//! let _guard = semaphore.acquire(Duration::from_secs(60))?;
//! // ... critical section ...
//! // released on drop
//! ```

use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Name of the semaphore serializing application directory creation
pub const APPLICATION_DIRECTORY_LOCK: &str = "outpost-application-directory";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A lock shared by name between agent processes
#[derive(Debug, Clone)]
pub struct NamedSemaphore {
    name: String,
    path: PathBuf,
}

impl NamedSemaphore {
    pub fn new(lock_dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let path = lock_dir.as_ref().join(format!("{}.lock", name));
        Self { name, path }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the semaphore is held or `timeout` elapses
    pub fn acquire(&self, timeout: Duration) -> Result<SemaphoreGuard> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)?;

        let started = Instant::now();
        let mut announced = false;
        loop {
            match fs2::FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    debug!("Acquired semaphore '{}'", self.name);
                    return Ok(SemaphoreGuard {
                        file,
                        name: self.name.clone(),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {}
                Err(e) => {
                    return Err(Error::Lock(format!(
                        "Failed to acquire semaphore '{}': {}",
                        self.name, e
                    )));
                }
            }

            if started.elapsed() >= timeout {
                return Err(Error::Lock(format!(
                    "Timed out after {:?} waiting for semaphore '{}'",
                    timeout, self.name
                )));
            }
            if !announced {
                info!(
                    "Another process is using semaphore '{}', waiting for it to be released",
                    self.name
                );
                announced = true;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Holds a [`NamedSemaphore`] until dropped
#[derive(Debug)]
pub struct SemaphoreGuard {
    file: File,
    name: String,
}

impl Drop for SemaphoreGuard {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!("Failed to release semaphore '{}': {}", self.name, e);
        } else {
            debug!("Released semaphore '{}'", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let temp = TempDir::new().unwrap();
        let semaphore = NamedSemaphore::new(temp.path(), "test");

        let guard = semaphore.acquire(Duration::from_secs(1)).unwrap();
        assert!(temp.path().join("test.lock").exists());
        drop(guard);

        semaphore.acquire(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_timeout_while_held() {
        let temp = TempDir::new().unwrap();
        let semaphore = NamedSemaphore::new(temp.path(), "busy");
        let _held = semaphore.acquire(Duration::from_secs(1)).unwrap();

        let err = semaphore.acquire(Duration::from_millis(250)).unwrap_err();
        assert!(matches!(err, Error::Lock(_)));
    }
}

// src/journal/mod.rs

//! Installation journal
//!
//! Append-only record of deployment attempts, used to skip packages that are
//! already installed, to expose the previous installation to conventions and
//! to drive retention clean-up.
//!
//! Format: one record per line, `{crc32_hex}|{json}\n`. A record whose
//! checksum does not match (a write torn by a crash) is skipped with a warning
//! and reading carries on; later appends start on a fresh line.
//!
//! All access is serialized across processes through an `fs2` lock on a
//! sibling `.lock` file, so a rewrite (which replaces the journal file) never
//! races an append.

mod entry;
pub mod retention;

pub use entry::{DeployedPackage, JournalEntry};
pub use retention::{RetentionPolicy, RetentionReport, RetentionRule};

use crate::error::{Error, Result};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persistent journal of past installations
#[derive(Debug, Clone)]
pub struct DeploymentJournal {
    path: PathBuf,
    lock_path: PathBuf,
}

impl DeploymentJournal {
    /// Open (or prepare to create) the journal at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);

        Ok(Self { path, lock_path })
    }

    /// Get the journal file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self, exclusive: bool) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|e| {
            Error::Lock(format!(
                "Failed to lock journal {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(file)
    }

    /// Append an entry and fsync
    pub fn add_journal_entry(&self, entry: &JournalEntry) -> Result<()> {
        let _lock = self.lock(true)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        if ends_mid_record(&mut file)? {
            warn!(
                "Journal {} ends with an incomplete record, starting a new line",
                self.path.display()
            );
            writeln!(file)?;
        }
        writeln!(file, "{}", encode_record(entry)?)?;
        file.flush()?;
        file.sync_all()?;

        debug!(
            "Journal entry {} written for {} {} (successful: {})",
            entry.id, entry.package.package_id, entry.package.package_version, entry.was_successful
        );
        Ok(())
    }

    /// Every readable entry in append order
    pub fn get_all_journal_entries(&self) -> Result<Vec<JournalEntry>> {
        let _lock = self.lock(false)?;
        self.read_entries()
    }

    /// Most recently appended entry for the policy set (and package, if given)
    pub fn get_latest_installation(
        &self,
        policy_set: &str,
        package: Option<(&str, &str)>,
    ) -> Result<Option<JournalEntry>> {
        Ok(self
            .get_all_journal_entries()?
            .into_iter()
            .rev()
            .find(|e| e.matches(policy_set, package)))
    }

    /// Like [`get_latest_installation`](Self::get_latest_installation), successful entries only
    pub fn get_latest_successful_installation(
        &self,
        policy_set: &str,
        package: Option<(&str, &str)>,
    ) -> Result<Option<JournalEntry>> {
        Ok(self
            .get_all_journal_entries()?
            .into_iter()
            .rev()
            .find(|e| e.was_successful && e.matches(policy_set, package)))
    }

    /// Drop entries by id, rewriting the journal; returns how many were removed
    pub fn remove_journal_entries(&self, ids: &[String]) -> Result<usize> {
        let _lock = self.lock(true)?;
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let entries = self.read_entries()?;
        let before = entries.len();
        let kept: Vec<&JournalEntry> = entries
            .iter()
            .filter(|e| !ids.contains(e.id.as_str()))
            .collect();
        let removed = before - kept.len();
        if removed == 0 {
            return Ok(0);
        }

        let directory = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(directory)?;
        for entry in kept {
            writeln!(temp, "{}", encode_record(entry)?)?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!("Removed {} journal entries", removed);
        Ok(removed)
    }

    fn read_entries(&self) -> Result<Vec<JournalEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            // Parse format: {crc32}|{json}
            let Some((crc_text, json)) = line.split_once('|') else {
                warn!("Malformed journal line {}: missing delimiter", line_num + 1);
                continue;
            };

            let Ok(expected_crc) = u32::from_str_radix(crc_text, 16) else {
                warn!("Skipping journal line {}: invalid CRC32 '{}'", line_num + 1, crc_text);
                continue;
            };
            let actual_crc = crc32fast::hash(json.as_bytes());
            if expected_crc != actual_crc {
                warn!(
                    "Skipping journal line {}: CRC mismatch (expected {:08x}, got {:08x})",
                    line_num + 1,
                    expected_crc,
                    actual_crc
                );
                continue;
            }

            let entry: JournalEntry = serde_json::from_str(json).map_err(|e| {
                Error::Journal(format!(
                    "Failed to parse journal entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }
}

/// Whether the last record was cut off before its newline
fn ends_mid_record(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn encode_record(entry: &JournalEntry) -> Result<String> {
    let json = serde_json::to_string(entry)?;
    let crc = crc32fast::hash(json.as_bytes());
    Ok(format!("{:08x}|{}", crc, json))
}

// src/journal/retention.rs

//! Retention clean-up for a retention policy set
//!
//! Removes old journal entries together with the extracted directories and
//! package files they point to. A path is only deleted when no remaining
//! journal entry still references it.

use super::{DeploymentJournal, JournalEntry};
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How much history to keep
///
/// A count of zero keeps everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionRule {
    /// Entries installed within this many days
    Days(u32),
    /// The current release plus this many previous successful releases
    Releases(usize),
}

impl RetentionRule {
    pub fn keeps_all(&self) -> bool {
        matches!(self, Self::Days(0) | Self::Releases(0))
    }
}

/// Outcome of a retention pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetentionReport {
    pub removed_entries: usize,
    pub deleted_directories: Vec<PathBuf>,
    pub deleted_files: Vec<PathBuf>,
}

/// Applies retention rules against a journal
pub struct RetentionPolicy<'a> {
    journal: &'a DeploymentJournal,
}

impl<'a> RetentionPolicy<'a> {
    pub fn new(journal: &'a DeploymentJournal) -> Self {
        Self { journal }
    }

    /// Remove entries of `policy_set` that fall outside `rule`
    pub fn apply(
        &self,
        policy_set: &str,
        rule: RetentionRule,
        now: DateTime<Utc>,
    ) -> Result<RetentionReport> {
        if rule.keeps_all() {
            info!("Retention for '{}': keeping all releases", policy_set);
            return Ok(RetentionReport::default());
        }

        let entries = self.journal.get_all_journal_entries()?;
        let candidates: Vec<&JournalEntry> = entries
            .iter()
            .filter(|e| e.retention_policy_set == policy_set)
            .collect();

        let doomed: HashSet<&str> = select_for_removal(&candidates, rule, now)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        if doomed.is_empty() {
            info!("Retention for '{}': nothing to remove", policy_set);
            return Ok(RetentionReport::default());
        }

        let (removed, kept): (Vec<&JournalEntry>, Vec<&JournalEntry>) =
            entries.iter().partition(|e| doomed.contains(e.id.as_str()));

        let referenced: HashSet<&Path> = kept
            .iter()
            .flat_map(|e| {
                [
                    e.extracted_to.as_deref(),
                    e.package.deployed_from.as_deref(),
                ]
            })
            .flatten()
            .collect();

        let mut report = RetentionReport::default();
        for entry in &removed {
            if let Some(dir) = entry.extracted_to.as_deref()
                && !referenced.contains(dir)
                && dir.is_dir()
            {
                match fs::remove_dir_all(dir) {
                    Ok(()) => report.deleted_directories.push(dir.to_path_buf()),
                    Err(e) => warn!("Could not delete directory {}: {}", dir.display(), e),
                }
            }
            if let Some(file) = entry.package.deployed_from.as_deref()
                && !referenced.contains(file)
                && file.is_file()
            {
                match fs::remove_file(file) {
                    Ok(()) => report.deleted_files.push(file.to_path_buf()),
                    Err(e) => warn!("Could not delete package {}: {}", file.display(), e),
                }
            }
        }

        let ids: Vec<String> = removed.iter().map(|e| e.id.clone()).collect();
        report.removed_entries = self.journal.remove_journal_entries(&ids)?;
        info!(
            "Retention for '{}': removed {} entries, {} directories, {} package files",
            policy_set,
            report.removed_entries,
            report.deleted_directories.len(),
            report.deleted_files.len()
        );
        Ok(report)
    }
}

/// Entries (in append order) that fall outside the rule
fn select_for_removal<'e>(
    entries: &[&'e JournalEntry],
    rule: RetentionRule,
    now: DateTime<Utc>,
) -> Vec<&'e JournalEntry> {
    match rule {
        RetentionRule::Days(0) | RetentionRule::Releases(0) => Vec::new(),
        RetentionRule::Days(days) => {
            let cutoff = now - Duration::days(i64::from(days));
            // The newest successful install is what is running right now
            let newest_successful = entries
                .iter()
                .rev()
                .find(|e| e.was_successful)
                .map(|e| e.id.as_str());
            entries
                .iter()
                .filter(|e| e.installed_on < cutoff && Some(e.id.as_str()) != newest_successful)
                .copied()
                .collect()
        }
        RetentionRule::Releases(releases) => {
            // Failed entries between kept releases are kept but not counted
            let mut successful = 0;
            let mut keep = entries.len();
            for (index, entry) in entries.iter().enumerate().rev() {
                if successful > releases {
                    break;
                }
                keep = index;
                if entry.was_successful {
                    successful += 1;
                }
            }
            entries[..keep].to_vec()
        }
    }
}

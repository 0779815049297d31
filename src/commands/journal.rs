// src/commands/journal.rs

//! Journal queries and retention

use super::open_journal;
use anyhow::{Result, bail};
use chrono::Utc;
use outpost::config::AgentConfig;
use outpost::journal::{JournalEntry, RetentionPolicy, RetentionRule};

/// Show the latest installation for a policy set
pub fn cmd_journal_latest(
    config: &AgentConfig,
    policy_set: &str,
    package: Option<(&str, &str)>,
    successful: bool,
) -> Result<()> {
    let journal = open_journal(config)?;
    let entry = if successful {
        journal.get_latest_successful_installation(policy_set, package)?
    } else {
        journal.get_latest_installation(policy_set, package)?
    };

    match entry {
        Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
        None => println!("No matching installation for '{}'.", policy_set),
    }
    Ok(())
}

/// List journal entries, optionally for one policy set
pub fn cmd_journal_list(config: &AgentConfig, policy_set: Option<&str>) -> Result<()> {
    let journal = open_journal(config)?;
    let entries: Vec<JournalEntry> = journal
        .get_all_journal_entries()?
        .into_iter()
        .filter(|e| policy_set.is_none_or(|set| e.retention_policy_set == set))
        .collect();

    if entries.is_empty() {
        println!("The journal is empty.");
        return Ok(());
    }

    println!("Journal entries ({}):", entries.len());
    for entry in &entries {
        let status = if entry.was_successful { "ok" } else { "FAILED" };
        print!(
            "  {} {} {} [{}] {}",
            entry.installed_on.format("%Y-%m-%d %H:%M:%S"),
            entry.package.package_id,
            entry.package.package_version,
            entry.retention_policy_set,
            status
        );
        if let Some(dir) = entry.installation_directory() {
            print!(" -> {}", dir.display());
        }
        println!();
    }
    Ok(())
}

/// Apply a retention rule to a policy set
pub fn cmd_retention(
    config: &AgentConfig,
    policy_set: &str,
    days: Option<u32>,
    releases: Option<usize>,
) -> Result<()> {
    let rule = match (days, releases) {
        (Some(days), None) => RetentionRule::Days(days),
        (None, Some(releases)) => RetentionRule::Releases(releases),
        _ => bail!("Specify exactly one of --days or --releases"),
    };

    let journal = open_journal(config)?;
    let report = RetentionPolicy::new(&journal).apply(policy_set, rule, Utc::now())?;

    println!(
        "Removed {} journal entries, {} directories and {} package files.",
        report.removed_entries,
        report.deleted_directories.len(),
        report.deleted_files.len()
    );
    Ok(())
}

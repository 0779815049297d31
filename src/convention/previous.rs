// src/convention/previous.rs

use crate::deployment::RunningDeployment;
use crate::deployment::known::agent::{
    PREVIOUS_INSTALLATION, PREVIOUS_SUCCESSFUL_INSTALLATION, PreviousInstallation,
};
use crate::error::Result;
use crate::journal::{DeploymentJournal, JournalEntry};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Publishes details of the previous installation for the policy set
///
/// Every variable is set, to an empty string when there is no such entry, so
/// scripts can reference them unconditionally.
#[derive(Debug, Clone)]
pub struct ContributePreviousInstallation {
    journal: Arc<DeploymentJournal>,
    successful_only: bool,
}

impl ContributePreviousInstallation {
    /// Most recent installation, whatever its outcome
    pub fn latest(journal: Arc<DeploymentJournal>) -> Self {
        Self {
            journal,
            successful_only: false,
        }
    }

    /// Most recent successful installation
    pub fn latest_successful(journal: Arc<DeploymentJournal>) -> Self {
        Self {
            journal,
            successful_only: true,
        }
    }

    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        let policy_set = deployment.retention_policy_set();
        let (previous, names) = if self.successful_only {
            (
                self.journal
                    .get_latest_successful_installation(&policy_set, None)?,
                &PREVIOUS_SUCCESSFUL_INSTALLATION,
            )
        } else {
            (
                self.journal.get_latest_installation(&policy_set, None)?,
                &PREVIOUS_INSTALLATION,
            )
        };

        match &previous {
            Some(entry) => debug!(
                "Previous installation of '{}': {} {}",
                policy_set, entry.package.package_id, entry.package.package_version
            ),
            None => debug!("No previous installation of '{}'", policy_set),
        }
        publish(deployment, names, previous.as_ref());
        Ok(())
    }
}

fn publish(
    deployment: &mut RunningDeployment,
    names: &PreviousInstallation,
    entry: Option<&JournalEntry>,
) {
    let path = |p: Option<&Path>| p.map(|p| p.display().to_string()).unwrap_or_default();
    let variables = deployment.variables_mut();

    variables.set(
        names.original_installed_path,
        path(entry.and_then(|e| e.extracted_to.as_deref())),
    );
    variables.set(
        names.package_file_path,
        path(entry.and_then(|e| e.package.deployed_from.as_deref())),
    );
    variables.set(
        names.package_version,
        entry
            .map(|e| e.package.package_version.clone())
            .unwrap_or_default(),
    );
    variables.set(
        names.custom_installation_directory,
        path(entry.and_then(|e| e.custom_installation_directory.as_deref())),
    );
}

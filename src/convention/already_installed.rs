// src/convention/already_installed.rs

use crate::deployment::{RunningDeployment, known};
use crate::error::Result;
use crate::journal::DeploymentJournal;
use std::sync::Arc;
use tracing::info;

/// Stops the deployment when this exact package version is already installed
///
/// Only active when `SkipIfAlreadyInstalled` is set. The installation path
/// of the existing install is republished so later steps see the same
/// outputs as a full deployment.
#[derive(Debug, Clone)]
pub struct AlreadyInstalled {
    journal: Arc<DeploymentJournal>,
}

impl AlreadyInstalled {
    pub fn new(journal: Arc<DeploymentJournal>) -> Self {
        Self { journal }
    }

    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        if !deployment
            .variables()
            .get_flag(known::package::SKIP_IF_ALREADY_INSTALLED, false)
        {
            return Ok(());
        }

        let (Some(id), Some(version)) = (deployment.package_id(), deployment.package_version())
        else {
            return Ok(());
        };
        let policy_set = deployment.retention_policy_set();

        let Some(previous) = self
            .journal
            .get_latest_installation(&policy_set, Some((&id, &version)))?
        else {
            return Ok(());
        };

        if !previous.was_successful {
            info!(
                "The previous attempt to deploy {} {} failed, so it will be deployed again",
                id, version
            );
            return Ok(());
        }

        info!(
            "The package {} {} has already been installed on this machine, so installation will be skipped",
            id, version
        );
        let variables = deployment.variables_mut();
        if let Some(directory) = previous.installation_directory() {
            variables.set_output(
                known::package::INSTALLATION_DIRECTORY_PATH,
                directory.display().to_string(),
            );
        }
        variables.set_flag(known::action::SKIP_REMAINING_CONVENTIONS, true);
        variables.set_flag(known::action::SKIP_JOURNAL, true);
        Ok(())
    }
}

// src/convention/custom_directory.rs

use crate::deployment::{DirectoryRole, RunningDeployment, known};
use crate::error::{Error, Result};
use crate::filesystem::{self, path};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Copies the extracted package to the caller's custom installation directory
///
/// Without a custom directory the staging directory is published as the
/// installation directory and nothing is copied.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyPackageToCustomInstallationDirectory;

impl CopyPackageToCustomInstallationDirectory {
    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        let staging = deployment.staging_directory();
        let template = deployment
            .variables()
            .get_raw(known::package::CUSTOM_INSTALLATION_DIRECTORY)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string);

        let Some(template) = template else {
            deployment.variables_mut().set_output(
                known::package::INSTALLATION_DIRECTORY_PATH,
                staging.display().to_string(),
            );
            return Ok(());
        };

        let evaluation = deployment.variables().evaluate(&template);
        if !evaluation.unresolved.is_empty() {
            let tokens: Vec<String> = evaluation
                .unresolved
                .iter()
                .map(|name| format!("#{{{}}}", name))
                .collect();
            return Err(Error::Command(format!(
                "An error occurred when evaluating the value for the custom install directory. \
                 The following tokens were unable to be evaluated: '{}'",
                tokens.join("', '")
            )));
        }

        let custom = evaluation.value.trim().to_string();
        if !path::is_rooted(&custom) {
            return Err(Error::Command(format!(
                "The custom install directory '{}' is a relative path, please specify the path \
                 as an absolute path or a UNC path.",
                custom
            )));
        }

        let custom_path = PathBuf::from(&custom);
        if path::is_same_or_child_of(&custom_path, &staging) {
            return Err(Error::Command(format!(
                "The custom install directory '{}' is the same as or a child of the staging \
                 directory '{}', please choose another location.",
                custom,
                staging.display()
            )));
        }

        deployment
            .variables_mut()
            .set(known::package::CUSTOM_INSTALLATION_DIRECTORY, custom.clone());

        let copied = copy_to_custom(deployment, &staging, &custom_path)
            .map_err(|e| explain_access_denied(e, &custom_path))?;

        let variables = deployment.variables_mut();
        variables.set_output(known::package::COPIED_FILE_COUNT, copied.to_string());
        variables.set_output(known::package::INSTALLATION_DIRECTORY_PATH, custom);
        deployment.set_current_directory_role(DirectoryRole::Custom);
        Ok(())
    }
}

fn copy_to_custom(deployment: &RunningDeployment, staging: &Path, custom: &Path) -> Result<usize> {
    fs::create_dir_all(custom)?;

    let variables = deployment.variables();
    if variables.get_flag(
        known::package::CUSTOM_INSTALLATION_DIRECTORY_SHOULD_BE_PURGED,
        false,
    ) {
        let exclusions = variables.get_strings(
            known::package::CUSTOM_INSTALLATION_DIRECTORY_PURGE_EXCLUSIONS,
            &['\n'],
        );
        info!("Purging the directory '{}'", custom.display());
        filesystem::purge_directory(custom, &exclusions)?;
    }

    info!(
        "Copying package contents to '{}'",
        custom.display()
    );
    let copied = filesystem::copy_directory(staging, custom)?;
    info!("Copied {} files to '{}'", copied, custom.display());
    Ok(copied)
}

fn explain_access_denied(error: Error, custom: &Path) -> Error {
    match error {
        Error::Io(e) if e.kind() == io::ErrorKind::PermissionDenied => Error::Command(format!(
            "Access to the path {} was denied. Ensure that the application that uses this \
             directory is not running.",
            custom.display()
        )),
        other => other,
    }
}

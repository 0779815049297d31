// src/convention/transfer.rs

use crate::deployment::{RunningDeployment, known};
use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Copies the package file, unextracted, to the transfer path
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferPackage;

impl TransferPackage {
    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        let package = deployment
            .package_file_path()
            .map(PathBuf::from)
            .ok_or_else(|| Error::Command("No package file was specified for transfer".to_string()))?;

        let directory = deployment
            .variables()
            .get_or(known::package::TRANSFER_PATH, "")
            .trim()
            .to_string();
        if directory.is_empty() {
            return Err(Error::Command(format!(
                "No transfer path was specified. Set the variable '{}'.",
                known::package::TRANSFER_PATH
            )));
        }
        let directory = PathBuf::from(directory);

        let file_name = match deployment
            .variables()
            .get_non_empty(known::package::ORIGINAL_FILE_NAME)
        {
            Some(name) => name,
            None => package
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| Error::InvalidPath(package.display().to_string()))?,
        };

        fs::create_dir_all(&directory)?;
        let destination = directory.join(&file_name);
        fs::copy(&package, &destination)?;
        info!(
            "Copied package '{}' to '{}'",
            package.display(),
            destination.display()
        );

        let variables = deployment.variables_mut();
        variables.set_output(known::package::DIRECTORY_PATH, directory.display().to_string());
        variables.set_output(known::package::FILE_NAME, file_name);
        variables.set_output(known::package::FILE_PATH, destination.display().to_string());
        Ok(())
    }
}

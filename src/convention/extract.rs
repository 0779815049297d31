// src/convention/extract.rs

use crate::deployment::{RunningDeployment, known};
use crate::error::Result;
use crate::extraction::ExtractorRegistry;
use crate::package::extract_package_name_from_pathed_id;
use crate::placement::{ApplicationDirectory, DirectoryPlacement};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extracts the package into a freshly placed application directory
#[derive(Debug, Clone)]
pub struct ExtractPackageToApplicationDirectory {
    registry: ExtractorRegistry,
    placement: DirectoryPlacement,
}

impl ExtractPackageToApplicationDirectory {
    pub fn new(registry: ExtractorRegistry, placement: DirectoryPlacement) -> Self {
        Self {
            registry,
            placement,
        }
    }

    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        let Some(package) = deployment.package_file_path().map(Path::to_path_buf) else {
            debug!("No package path defined, skipping package extraction");
            return Ok(());
        };

        let (id, version) = match (deployment.package_id(), deployment.package_version()) {
            (Some(id), Some(version)) => (id, version),
            _ => {
                let identity = self.registry.get_metadata(&package)?;
                (identity.id, identity.version.to_string())
            }
        };

        let desired = ApplicationDirectory::resolve(
            deployment.variables(),
            extract_package_name_from_pathed_id(&id),
            &version,
        )?;
        // Placement holds the semaphore only while the directory is created
        let target = self.placement.create_unique_directory(&desired)?;

        let count = self.registry.extract(&package, &target, true)?;
        publish(deployment, &target, count);
        Ok(())
    }
}

/// Extracts the package into the working directory
#[derive(Debug, Clone, Default)]
pub struct ExtractPackageToStagingDirectory {
    registry: ExtractorRegistry,
}

impl ExtractPackageToStagingDirectory {
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self { registry }
    }

    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        let Some(package) = deployment.package_file_path().map(Path::to_path_buf) else {
            debug!("No package path defined, skipping package extraction");
            return Ok(());
        };

        let target: PathBuf = deployment.working_directory().to_path_buf();
        let count = self.registry.extract(&package, &target, false)?;
        publish(deployment, &target, count);
        Ok(())
    }
}

fn publish(deployment: &mut RunningDeployment, target: &Path, count: usize) {
    info!("Extracted {} files to {}", count, target.display());
    let target = target.display().to_string();
    let variables = deployment.variables_mut();
    variables.set(known::ORIGINAL_PACKAGE_DIRECTORY_PATH, target.clone());
    variables.set_output(known::package::EXTRACTED_FILE_COUNT, count.to_string());
    variables.set_output(known::package::INSTALLATION_DIRECTORY_PATH, target);
}

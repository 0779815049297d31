// src/journal/entry.rs

use crate::deployment::{RunningDeployment, known};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The package a journal entry refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedPackage {
    pub package_id: String,
    pub package_version: String,
    /// Package file the deployment was made from
    pub deployed_from: Option<PathBuf>,
}

/// One deployment attempt, successful or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub environment_id: Option<String>,
    pub tenant_id: Option<String>,
    pub project_id: Option<String>,
    pub retention_policy_set: String,
    pub installed_on: DateTime<Utc>,
    pub package: DeployedPackage,
    pub extracted_to: Option<PathBuf>,
    pub custom_installation_directory: Option<PathBuf>,
    pub was_successful: bool,
}

impl JournalEntry {
    /// Describe the outcome of a deployment
    pub fn from_deployment(deployment: &RunningDeployment, was_successful: bool) -> Self {
        let variables = deployment.variables();
        let deployed_from = deployment
            .package_file_path()
            .map(PathBuf::from)
            .or_else(|| variables.get_path(known::agent::CURRENT_PACKAGE_FILE_PATH));

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            environment_id: variables.get_non_empty(known::environment::ID),
            tenant_id: variables.get_non_empty(known::tenant::ID),
            project_id: variables.get_non_empty(known::project::ID),
            retention_policy_set: deployment.retention_policy_set(),
            installed_on: Utc::now(),
            package: DeployedPackage {
                package_id: deployment.package_id().unwrap_or_default(),
                package_version: deployment.package_version().unwrap_or_default(),
                deployed_from,
            },
            extracted_to: deployment.original_extraction_directory(),
            custom_installation_directory: deployment.custom_directory(),
            was_successful,
        }
    }

    /// Whether this entry belongs to `policy_set` and, if given, the package
    pub fn matches(&self, policy_set: &str, package: Option<(&str, &str)>) -> bool {
        self.retention_policy_set == policy_set
            && package.is_none_or(|(id, version)| {
                self.package.package_id == id && self.package.package_version == version
            })
    }

    /// Where the content of this installation ended up
    pub fn installation_directory(&self) -> Option<&PathBuf> {
        self.custom_installation_directory
            .as_ref()
            .or(self.extracted_to.as_ref())
    }
}

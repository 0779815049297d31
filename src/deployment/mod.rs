// src/deployment/mod.rs

//! Deployment context
//!
//! A [`RunningDeployment`] is created once per deployment invocation and is
//! handed by mutable reference to every convention in turn. It owns the
//! variable dictionary and tracks which directory conventions should treat as
//! current: the staging directory (where the package was extracted) or the
//! custom installation directory once content has been relocated there.

pub mod known;
mod runner;
mod variables;

pub use runner::{DeploymentOutcome, PackageDeployer};
pub use variables::{Evaluation, VariableDictionary};

use crate::error::Error;
use std::path::{Path, PathBuf};

/// Which directory conventions see as current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryRole {
    #[default]
    Staging,
    Custom,
}

/// Mutable state shared by the conventions of one deployment
#[derive(Debug)]
pub struct RunningDeployment {
    package_file_path: Option<PathBuf>,
    variables: VariableDictionary,
    working_directory: PathBuf,
    current_directory: DirectoryRole,
    error: Option<String>,
}

impl RunningDeployment {
    /// Create a deployment rooted at `working_directory`
    pub fn new(
        package_file_path: Option<PathBuf>,
        variables: VariableDictionary,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            package_file_path,
            variables,
            working_directory: working_directory.into(),
            current_directory: DirectoryRole::default(),
            error: None,
        }
    }

    pub fn package_file_path(&self) -> Option<&Path> {
        self.package_file_path.as_deref()
    }

    pub fn variables(&self) -> &VariableDictionary {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableDictionary {
        &mut self.variables
    }

    pub fn into_variables(self) -> VariableDictionary {
        self.variables
    }

    /// Directory the agent was started in
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Where the package was extracted, once an extraction convention has run
    pub fn original_extraction_directory(&self) -> Option<PathBuf> {
        self.variables.get_path(known::ORIGINAL_PACKAGE_DIRECTORY_PATH)
    }

    /// The extracted package, falling back to the working directory
    pub fn staging_directory(&self) -> PathBuf {
        self.original_extraction_directory()
            .unwrap_or_else(|| self.working_directory.clone())
    }

    /// Caller-requested final location, if any
    pub fn custom_directory(&self) -> Option<PathBuf> {
        self.variables
            .get_path(known::package::CUSTOM_INSTALLATION_DIRECTORY)
    }

    pub fn current_directory_role(&self) -> DirectoryRole {
        self.current_directory
    }

    pub fn set_current_directory_role(&mut self, role: DirectoryRole) {
        self.current_directory = role;
    }

    /// The directory subsequent conventions should work in
    pub fn current_directory(&self) -> PathBuf {
        match self.current_directory {
            DirectoryRole::Staging => self.staging_directory(),
            DirectoryRole::Custom => self
                .custom_directory()
                .unwrap_or_else(|| self.staging_directory()),
        }
    }

    pub fn skip_remaining_conventions(&self) -> bool {
        self.variables
            .get_flag(known::action::SKIP_REMAINING_CONVENTIONS, false)
    }

    pub fn skip_journal(&self) -> bool {
        self.variables.get_flag(known::action::SKIP_JOURNAL, false)
    }

    /// Record the failure that aborted the install conventions
    ///
    /// Rollback conventions read the message from the error variables.
    pub fn record_error(&mut self, error: &Error) {
        let message = error.to_string();
        self.variables.set(known::deployment::ERROR, message.clone());
        self.variables
            .set(known::deployment::ERROR_DETAIL, format!("{:?}", error));
        self.error = Some(message);
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Package id from variables, else from the package file name
    pub fn package_id(&self) -> Option<String> {
        self.variables
            .get_non_empty(known::package::PACKAGE_ID)
            .or_else(|| self.package_identity().map(|p| p.id))
    }

    /// Package version from variables, else from the package file name
    pub fn package_version(&self) -> Option<String> {
        self.variables
            .get_non_empty(known::package::PACKAGE_VERSION)
            .or_else(|| self.package_identity().map(|p| p.version.to_string()))
    }

    pub fn retention_policy_set(&self) -> String {
        self.variables.get_or(known::RETENTION_POLICY_SET, "")
    }

    fn package_identity(&self) -> Option<crate::package::PackageIdentity> {
        self.package_file_path
            .as_deref()
            .and_then(|path| crate::package::name::try_from_file(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(vars: &[(&str, &str)]) -> RunningDeployment {
        RunningDeployment::new(
            Some(PathBuf::from("/packages/Acme.Web.1.2.3.zip")),
            vars.iter().copied().collect(),
            "/work",
        )
    }

    #[test]
    fn test_directory_roles() {
        let mut d = deployment(&[]);
        assert_eq!(d.staging_directory(), PathBuf::from("/work"));
        assert_eq!(d.current_directory(), PathBuf::from("/work"));

        d.variables_mut()
            .set(known::ORIGINAL_PACKAGE_DIRECTORY_PATH, "/apps/Acme.Web/1.2.3");
        d.variables_mut()
            .set(known::package::CUSTOM_INSTALLATION_DIRECTORY, "/srv/web");
        assert_eq!(d.current_directory(), PathBuf::from("/apps/Acme.Web/1.2.3"));

        d.set_current_directory_role(DirectoryRole::Custom);
        assert_eq!(d.current_directory(), PathBuf::from("/srv/web"));
    }

    #[test]
    fn test_custom_role_without_custom_directory() {
        let mut d = deployment(&[]);
        d.set_current_directory_role(DirectoryRole::Custom);
        assert_eq!(d.current_directory(), PathBuf::from("/work"));
    }

    #[test]
    fn test_package_identity_fallbacks() {
        let d = deployment(&[]);
        assert_eq!(d.package_id().as_deref(), Some("Acme.Web"));
        assert_eq!(d.package_version().as_deref(), Some("1.2.3"));

        let d = deployment(&[(known::package::PACKAGE_ID, "Override")]);
        assert_eq!(d.package_id().as_deref(), Some("Override"));
    }

    #[test]
    fn test_skip_flags_and_errors() {
        let mut d = deployment(&[(known::action::SKIP_JOURNAL, "true")]);
        assert!(d.skip_journal());
        assert!(!d.skip_remaining_conventions());

        d.record_error(&Error::Command("boom".to_string()));
        assert_eq!(d.error(), Some("boom"));
        assert_eq!(d.variables().get_raw(known::deployment::ERROR), Some("boom"));
    }
}

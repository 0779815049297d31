// src/convention/mod.rs

//! Convention pipeline
//!
//! A deployment is a fixed sequence of conventions, each a small step that
//! reads and writes the [`RunningDeployment`]. The standard sequences are
//! assembled by [`ConventionRegistry`]; external collaborators (script
//! engines, configuration transforms, substitution) plug in as
//! [`ConventionHook`]s at well-defined stages.
//!
//! # Execution
//!
//! Install conventions run in order until one fails or a convention sets
//! `SkipRemainingConventions`. On failure the error is recorded into the
//! deployment variables, every rollback convention runs (their own errors are
//! logged and swallowed) and the original error is returned.

mod already_installed;
mod custom_directory;
mod extract;
mod previous;
mod transfer;

pub use already_installed::AlreadyInstalled;
pub use custom_directory::CopyPackageToCustomInstallationDirectory;
pub use extract::{ExtractPackageToApplicationDirectory, ExtractPackageToStagingDirectory};
pub use previous::ContributePreviousInstallation;
pub use transfer::TransferPackage;

use crate::deployment::{RunningDeployment, known};
use crate::error::Result;
use crate::extraction::ExtractorRegistry;
use crate::journal::DeploymentJournal;
use crate::placement::DirectoryPlacement;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

type HookAction = Box<dyn Fn(&mut RunningDeployment) -> Result<()> + Send + Sync>;

/// A named step supplied by an external collaborator
pub struct ConventionHook {
    name: String,
    when_flag: Option<String>,
    action: HookAction,
}

impl ConventionHook {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut RunningDeployment) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            when_flag: None,
            action: Box::new(action),
        }
    }

    /// Only run when the boolean variable `flag` is true
    pub fn when(mut self, flag: impl Into<String>) -> Self {
        self.when_flag = Some(flag.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        if let Some(flag) = &self.when_flag
            && !deployment.variables().get_flag(flag, false)
        {
            info!("Skipping {}: '{}' is not enabled", self.name, flag);
            return Ok(());
        }
        (self.action)(deployment)
    }
}

impl fmt::Debug for ConventionHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionHook")
            .field("name", &self.name)
            .field("when_flag", &self.when_flag)
            .finish_non_exhaustive()
    }
}

/// One step of a deployment
#[derive(Debug)]
pub enum Convention {
    ContributePreviousInstallation(ContributePreviousInstallation),
    ContributePreviousSuccessfulInstallation(ContributePreviousInstallation),
    LogVariables,
    AlreadyInstalled(AlreadyInstalled),
    ExtractPackageToApplicationDirectory(ExtractPackageToApplicationDirectory),
    ExtractPackageToStagingDirectory(ExtractPackageToStagingDirectory),
    CopyPackageToCustomInstallationDirectory(CopyPackageToCustomInstallationDirectory),
    TransferPackage(TransferPackage),
    Hook(ConventionHook),
}

impl Convention {
    pub fn name(&self) -> &str {
        match self {
            Self::ContributePreviousInstallation(_) => "ContributePreviousInstallation",
            Self::ContributePreviousSuccessfulInstallation(_) => {
                "ContributePreviousSuccessfulInstallation"
            }
            Self::LogVariables => "LogVariables",
            Self::AlreadyInstalled(_) => "AlreadyInstalled",
            Self::ExtractPackageToApplicationDirectory(_) => "ExtractPackageToApplicationDirectory",
            Self::ExtractPackageToStagingDirectory(_) => "ExtractPackageToStagingDirectory",
            Self::CopyPackageToCustomInstallationDirectory(_) => {
                "CopyPackageToCustomInstallationDirectory"
            }
            Self::TransferPackage(_) => "TransferPackage",
            Self::Hook(hook) => hook.name(),
        }
    }

    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        match self {
            Self::ContributePreviousInstallation(c)
            | Self::ContributePreviousSuccessfulInstallation(c) => c.run(deployment),
            Self::LogVariables => {
                log_variables(deployment);
                Ok(())
            }
            Self::AlreadyInstalled(c) => c.run(deployment),
            Self::ExtractPackageToApplicationDirectory(c) => c.run(deployment),
            Self::ExtractPackageToStagingDirectory(c) => c.run(deployment),
            Self::CopyPackageToCustomInstallationDirectory(c) => c.run(deployment),
            Self::TransferPackage(c) => c.run(deployment),
            Self::Hook(hook) => hook.run(deployment),
        }
    }
}

impl From<ConventionHook> for Convention {
    fn from(hook: ConventionHook) -> Self {
        Self::Hook(hook)
    }
}

fn log_variables(deployment: &RunningDeployment) {
    let variables = deployment.variables();
    if variables.get_flag(known::action::PRINT_VARIABLES, false) {
        info!("The following variables are available:");
        for (name, value) in variables.iter() {
            info!("[{}] = '{}'", name, value);
        }
    } else {
        debug!("{} variables are available", variables.len());
        for (name, value) in variables.iter() {
            debug!("[{}] = '{}'", name, value);
        }
    }
}

/// Install and rollback conventions for one kind of deployment
#[derive(Debug, Default)]
pub struct ConventionPipeline {
    install: Vec<Convention>,
    rollback: Vec<Convention>,
}

impl ConventionPipeline {
    pub fn builder() -> ConventionPipelineBuilder {
        ConventionPipelineBuilder::default()
    }

    pub fn install(&self) -> &[Convention] {
        &self.install
    }

    pub fn rollback(&self) -> &[Convention] {
        &self.rollback
    }

    /// Run the install conventions, rolling back on the first failure
    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        for convention in &self.install {
            if deployment.skip_remaining_conventions() {
                info!("Skipping the remaining conventions");
                break;
            }

            debug!("Running convention {}", convention.name());
            if let Err(err) = convention.run(deployment) {
                error!("{} failed: {}", convention.name(), err);
                deployment.record_error(&err);
                self.run_rollback(deployment);
                return Err(err);
            }
        }
        Ok(())
    }

    fn run_rollback(&self, deployment: &mut RunningDeployment) {
        for convention in &self.rollback {
            debug!("Running rollback convention {}", convention.name());
            if let Err(err) = convention.run(deployment) {
                error!("Rollback convention {} failed: {}", convention.name(), err);
            }
        }
    }
}

/// Builder for [`ConventionPipeline`]
#[derive(Debug, Default)]
pub struct ConventionPipelineBuilder {
    pipeline: ConventionPipeline,
}

impl ConventionPipelineBuilder {
    pub fn install(mut self, convention: impl Into<Convention>) -> Self {
        self.pipeline.install.push(convention.into());
        self
    }

    pub fn install_all(mut self, conventions: impl IntoIterator<Item = impl Into<Convention>>) -> Self {
        self.pipeline
            .install
            .extend(conventions.into_iter().map(Into::into));
        self
    }

    pub fn rollback(mut self, convention: impl Into<Convention>) -> Self {
        self.pipeline.rollback.push(convention.into());
        self
    }

    pub fn rollback_all(mut self, conventions: impl IntoIterator<Item = impl Into<Convention>>) -> Self {
        self.pipeline
            .rollback
            .extend(conventions.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> ConventionPipeline {
        self.pipeline
    }
}

/// Hooks plugged into the standard sequences, grouped by stage
#[derive(Debug, Default)]
pub struct DeploymentHooks {
    /// Before any content is modified (pre-deploy scripts)
    pub pre_deploy: Vec<ConventionHook>,
    /// Run only when `SubstituteInFiles.Enabled` is set
    pub substitute_in_files: Vec<ConventionHook>,
    /// Configuration transforms
    pub configuration: Vec<ConventionHook>,
    /// Run only when `AutomaticallyUpdateAppSettingsAndConnectionStrings` is set
    pub configuration_variables: Vec<ConventionHook>,
    /// After content is in its final location (deploy scripts)
    pub post_deploy: Vec<ConventionHook>,
    /// Rollback conventions (deploy-failed scripts)
    pub deploy_failed: Vec<ConventionHook>,
}

/// Builds the standard convention sequences
pub struct ConventionRegistry;

impl ConventionRegistry {
    /// Extract, configure and install a package
    pub fn package_deployment(
        journal: Arc<DeploymentJournal>,
        registry: ExtractorRegistry,
        placement: DirectoryPlacement,
        hooks: DeploymentHooks,
    ) -> ConventionPipeline {
        let DeploymentHooks {
            pre_deploy,
            substitute_in_files,
            configuration,
            configuration_variables,
            post_deploy,
            deploy_failed,
        } = hooks;

        ConventionPipeline::builder()
            .install(Convention::ContributePreviousInstallation(
                ContributePreviousInstallation::latest(Arc::clone(&journal)),
            ))
            .install(Convention::ContributePreviousSuccessfulInstallation(
                ContributePreviousInstallation::latest_successful(Arc::clone(&journal)),
            ))
            .install(Convention::LogVariables)
            .install(Convention::AlreadyInstalled(AlreadyInstalled::new(journal)))
            .install(Convention::ExtractPackageToApplicationDirectory(
                ExtractPackageToApplicationDirectory::new(registry, placement),
            ))
            .install_all(pre_deploy)
            .install_all(gated(substitute_in_files, known::action::SUBSTITUTE_IN_FILES_ENABLED))
            .install_all(configuration)
            .install_all(gated(
                configuration_variables,
                known::package::AUTOMATICALLY_UPDATE_SETTINGS,
            ))
            .install(Convention::CopyPackageToCustomInstallationDirectory(
                CopyPackageToCustomInstallationDirectory,
            ))
            .install_all(post_deploy)
            .rollback_all(deploy_failed)
            .build()
    }

    /// Extract into the working directory and run the hooks there
    ///
    /// No application directory is placed and the journal is not consulted,
    /// so callers run this pipeline directly rather than through a
    /// [`PackageDeployer`](crate::deployment::PackageDeployer).
    pub fn package_staging(registry: ExtractorRegistry, hooks: DeploymentHooks) -> ConventionPipeline {
        let DeploymentHooks {
            pre_deploy,
            substitute_in_files,
            configuration,
            configuration_variables,
            post_deploy,
            deploy_failed,
        } = hooks;

        ConventionPipeline::builder()
            .install(Convention::LogVariables)
            .install(Convention::ExtractPackageToStagingDirectory(
                ExtractPackageToStagingDirectory::new(registry),
            ))
            .install_all(pre_deploy)
            .install_all(gated(substitute_in_files, known::action::SUBSTITUTE_IN_FILES_ENABLED))
            .install_all(configuration)
            .install_all(gated(
                configuration_variables,
                known::package::AUTOMATICALLY_UPDATE_SETTINGS,
            ))
            .install_all(post_deploy)
            .rollback_all(deploy_failed)
            .build()
    }

    /// Copy the package file to a transfer path without extracting it
    pub fn package_transfer(
        journal: Arc<DeploymentJournal>,
        hooks: DeploymentHooks,
    ) -> ConventionPipeline {
        ConventionPipeline::builder()
            .install(Convention::ContributePreviousInstallation(
                ContributePreviousInstallation::latest(Arc::clone(&journal)),
            ))
            .install(Convention::ContributePreviousSuccessfulInstallation(
                ContributePreviousInstallation::latest_successful(Arc::clone(&journal)),
            ))
            .install(Convention::LogVariables)
            .install(Convention::AlreadyInstalled(AlreadyInstalled::new(journal)))
            .install_all(hooks.pre_deploy)
            .install(Convention::TransferPackage(TransferPackage))
            .install_all(hooks.post_deploy)
            .rollback_all(hooks.deploy_failed)
            .build()
    }
}

fn gated(hooks: Vec<ConventionHook>, flag: &str) -> impl Iterator<Item = ConventionHook> + '_ {
    hooks.into_iter().map(move |hook| {
        if hook.when_flag.is_some() {
            hook
        } else {
            hook.when(flag)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Mutex;

    fn recording(name: &str, log: &Arc<Mutex<Vec<String>>>) -> ConventionHook {
        let log = Arc::clone(log);
        let label = name.to_string();
        ConventionHook::new(name, move |_| {
            log.lock().unwrap().push(label.clone());
            Ok(())
        })
    }

    fn deployment() -> RunningDeployment {
        RunningDeployment::new(None, Default::default(), "/work")
    }

    #[test]
    fn test_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = ConventionPipeline::builder()
            .install(recording("a", &log))
            .install(recording("b", &log))
            .rollback(recording("rollback", &log))
            .build();

        pipeline.run(&mut deployment()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_skip_remaining_conventions() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = ConventionPipeline::builder()
            .install(recording("a", &log))
            .install(ConventionHook::new("skip", |d| {
                d.variables_mut()
                    .set_flag(known::action::SKIP_REMAINING_CONVENTIONS, true);
                Ok(())
            }))
            .install(recording("c", &log))
            .build();

        pipeline.run(&mut deployment()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_failure_runs_every_rollback() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let rollback_log = Arc::new(Mutex::new(Vec::new()));
        let seen_error = Arc::new(Mutex::new(None));

        let broken = Arc::clone(&rollback_log);
        let capture = Arc::clone(&rollback_log);
        let seen = Arc::clone(&seen_error);

        let pipeline = ConventionPipeline::builder()
            .install(recording("a", &log))
            .install(ConventionHook::new("fail", |_| {
                Err(Error::Command("disk on fire".to_string()))
            }))
            .install(recording("never", &log))
            .rollback(ConventionHook::new("broken-rollback", move |_| {
                broken.lock().unwrap().push("broken-rollback".to_string());
                Err(Error::Command("rollback failed too".to_string()))
            }))
            .rollback(ConventionHook::new("capture", move |d| {
                capture.lock().unwrap().push("capture".to_string());
                *seen.lock().unwrap() = d.variables().get(known::deployment::ERROR);
                Ok(())
            }))
            .build();

        let mut d = deployment();
        let err = pipeline.run(&mut d).unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
        // Each rollback runs once, in declared order, past a failing one
        assert_eq!(*rollback_log.lock().unwrap(), vec!["broken-rollback", "capture"]);
        assert_eq!(seen_error.lock().unwrap().as_deref(), Some("disk on fire"));
        assert_eq!(d.error(), Some("disk on fire"));
    }

    #[test]
    fn test_gated_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = ConventionPipeline::builder()
            .install_all(gated(
                vec![recording("substitute", &log)],
                known::action::SUBSTITUTE_IN_FILES_ENABLED,
            ))
            .build();

        pipeline.run(&mut deployment()).unwrap();
        assert!(log.lock().unwrap().is_empty());

        let mut enabled = deployment();
        enabled
            .variables_mut()
            .set(known::action::SUBSTITUTE_IN_FILES_ENABLED, "True");
        pipeline.run(&mut enabled).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["substitute"]);
    }

    #[test]
    fn test_standard_sequence_order() {
        let temp = tempfile::TempDir::new().unwrap();
        let journal = Arc::new(DeploymentJournal::open(temp.path().join("journal.log")).unwrap());
        let placement = DirectoryPlacement::for_applications(temp.path(), std::time::Duration::from_secs(1));
        let hooks = DeploymentHooks {
            pre_deploy: vec![ConventionHook::new("PreDeploy", |_| Ok(()))],
            post_deploy: vec![ConventionHook::new("PostDeploy", |_| Ok(()))],
            deploy_failed: vec![ConventionHook::new("DeployFailed", |_| Ok(()))],
            ..Default::default()
        };

        let pipeline =
            ConventionRegistry::package_deployment(journal, ExtractorRegistry::new(), placement, hooks);
        let names: Vec<&str> = pipeline.install().iter().map(Convention::name).collect();
        assert_eq!(
            names,
            vec![
                "ContributePreviousInstallation",
                "ContributePreviousSuccessfulInstallation",
                "LogVariables",
                "AlreadyInstalled",
                "ExtractPackageToApplicationDirectory",
                "PreDeploy",
                "CopyPackageToCustomInstallationDirectory",
                "PostDeploy",
            ]
        );
        assert_eq!(pipeline.rollback().len(), 1);
    }

    #[test]
    fn test_staging_sequence_order() {
        let hooks = DeploymentHooks {
            configuration: vec![ConventionHook::new("Configure", |_| Ok(()))],
            post_deploy: vec![ConventionHook::new("PostDeploy", |_| Ok(()))],
            ..Default::default()
        };

        let pipeline = ConventionRegistry::package_staging(ExtractorRegistry::new(), hooks);
        let names: Vec<&str> = pipeline.install().iter().map(Convention::name).collect();
        assert_eq!(
            names,
            vec![
                "LogVariables",
                "ExtractPackageToStagingDirectory",
                "Configure",
                "PostDeploy",
            ]
        );
        assert!(pipeline.rollback().is_empty());
    }
}

// src/commands/deploy.rs

//! Deploy, stage and transfer commands

use super::{load_variables, open_journal};
use crate::cli::VariableArgs;
use anyhow::{Context, Result};
use outpost::config::AgentConfig;
use outpost::convention::{ConventionRegistry, DeploymentHooks};
use outpost::deployment::{PackageDeployer, RunningDeployment, known};
use outpost::extraction::ExtractorRegistry;
use outpost::placement::DirectoryPlacement;
use std::fs;
use std::path::Path;
use tracing::info;

/// Extract and install a package
pub fn cmd_deploy(config: &AgentConfig, package: &Path, args: &VariableArgs) -> Result<()> {
    let mut variables = load_variables(args, config)?;
    variables.set(
        known::agent::CURRENT_PACKAGE_FILE_PATH,
        package.display().to_string(),
    );

    let journal = open_journal(config)?;
    let placement = DirectoryPlacement::for_applications(config.lock_directory(), config.lock_timeout());
    let pipeline = ConventionRegistry::package_deployment(
        journal.clone(),
        ExtractorRegistry::new(),
        placement,
        DeploymentHooks::default(),
    );
    let deployer = PackageDeployer::new(journal, pipeline, std::env::current_dir()?);

    info!("Deploying {}", package.display());
    let outcome = deployer
        .deploy(Some(package.to_path_buf()), variables)
        .with_context(|| format!("Deployment of {} failed", package.display()))?;
    print_outputs(&outcome.outputs);
    Ok(())
}

/// Extract a package into `working_directory` and run the staging hooks
pub fn cmd_stage(
    config: &AgentConfig,
    package: &Path,
    working_directory: Option<&Path>,
    args: &VariableArgs,
) -> Result<()> {
    let mut variables = load_variables(args, config)?;
    variables.set(
        known::agent::CURRENT_PACKAGE_FILE_PATH,
        package.display().to_string(),
    );

    let working_directory = match working_directory {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    fs::create_dir_all(&working_directory)
        .with_context(|| format!("Failed to create {}", working_directory.display()))?;

    let pipeline = ConventionRegistry::package_staging(ExtractorRegistry::new(), DeploymentHooks::default());
    let mut deployment = RunningDeployment::new(Some(package.to_path_buf()), variables, working_directory);

    info!("Staging {}", package.display());
    pipeline
        .run(&mut deployment)
        .with_context(|| format!("Staging of {} failed", package.display()))?;
    print_outputs(&deployment.variables().outputs());
    Ok(())
}

/// Copy a package file to `destination`
pub fn cmd_transfer(
    config: &AgentConfig,
    package: &Path,
    destination: &Path,
    args: &VariableArgs,
) -> Result<()> {
    let mut variables = load_variables(args, config)?;
    variables.set(
        known::package::TRANSFER_PATH,
        destination.display().to_string(),
    );
    variables.set(
        known::agent::CURRENT_PACKAGE_FILE_PATH,
        package.display().to_string(),
    );

    let journal = open_journal(config)?;
    let pipeline = ConventionRegistry::package_transfer(journal.clone(), DeploymentHooks::default());
    let deployer = PackageDeployer::new(journal, pipeline, std::env::current_dir()?);

    let outcome = deployer
        .deploy(Some(package.to_path_buf()), variables)
        .with_context(|| format!("Transfer of {} failed", package.display()))?;
    print_outputs(&outcome.outputs);
    Ok(())
}

fn print_outputs(outputs: &[(String, String)]) {
    if outputs.is_empty() {
        println!("Deployment finished with no output variables.");
        return;
    }

    println!("Output variables:");
    for (name, value) in outputs {
        println!("  {} = {}", name, value);
    }
}

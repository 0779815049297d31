// src/commands/mod.rs
//! Command handlers for the Outpost CLI

mod deploy;
mod journal;
mod package;

pub use deploy::{cmd_deploy, cmd_stage, cmd_transfer};
pub use journal::{cmd_journal_latest, cmd_journal_list, cmd_retention};
pub use package::{cmd_package_decode, cmd_package_encode};

use crate::cli::VariableArgs;
use anyhow::{Context, Result};
use outpost::config::AgentConfig;
use outpost::deployment::{VariableDictionary, known};
use outpost::journal::DeploymentJournal;
use std::sync::Arc;

/// Variables file first, then `--var` assignments on top
fn load_variables(args: &VariableArgs, config: &AgentConfig) -> Result<VariableDictionary> {
    let mut variables = match &args.variables {
        Some(path) => VariableDictionary::from_file(path)
            .with_context(|| format!("Failed to load variables from {}", path.display()))?,
        None => VariableDictionary::new(),
    };

    for assignment in &args.vars {
        let (name, value) = VariableDictionary::parse_assignment(assignment)?;
        variables.set(name, value);
    }

    if let Some(root) = &config.application_directory
        && !variables.contains(known::agent::APPLICATION_DIRECTORY_PATH)
    {
        variables.set(
            known::agent::APPLICATION_DIRECTORY_PATH,
            root.display().to_string(),
        );
    }

    Ok(variables)
}

fn open_journal(config: &AgentConfig) -> Result<Arc<DeploymentJournal>> {
    let path = config.journal_path();
    let journal = DeploymentJournal::open(&path)
        .with_context(|| format!("Failed to open journal at {}", path.display()))?;
    Ok(Arc::new(journal))
}

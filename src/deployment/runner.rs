// src/deployment/runner.rs

use super::{RunningDeployment, VariableDictionary};
use crate::convention::ConventionPipeline;
use crate::error::Result;
use crate::journal::{DeploymentJournal, JournalEntry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Final state of a finished deployment
#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub variables: VariableDictionary,
    /// Output variables in the order they were published
    pub outputs: Vec<(String, String)>,
}

/// Runs a convention pipeline and records the result in the journal
#[derive(Debug)]
pub struct PackageDeployer {
    journal: Arc<DeploymentJournal>,
    pipeline: ConventionPipeline,
    working_directory: PathBuf,
}

impl PackageDeployer {
    pub fn new(
        journal: Arc<DeploymentJournal>,
        pipeline: ConventionPipeline,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            journal,
            pipeline,
            working_directory: working_directory.into(),
        }
    }

    /// Deploy `package` with `variables`
    pub fn deploy(
        &self,
        package: Option<PathBuf>,
        variables: VariableDictionary,
    ) -> Result<DeploymentOutcome> {
        let mut deployment = RunningDeployment::new(package, variables, &self.working_directory);
        self.run(&mut deployment)?;

        let outputs = deployment.variables().outputs();
        Ok(DeploymentOutcome {
            variables: deployment.into_variables(),
            outputs,
        })
    }

    /// Run the pipeline against an existing deployment
    ///
    /// A journal entry is appended whether the pipeline succeeded or failed,
    /// unless a convention set `SkipJournal`.
    pub fn run(&self, deployment: &mut RunningDeployment) -> Result<()> {
        let result = self.pipeline.run(deployment);

        if deployment.skip_journal() {
            info!("Not recording this deployment in the journal");
            return result;
        }

        let entry = JournalEntry::from_deployment(deployment, result.is_ok());
        match (result, self.journal.add_journal_entry(&entry)) {
            (Ok(()), journaled) => journaled,
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(journal_err)) => {
                warn!("Could not record the failed deployment: {}", journal_err);
                Err(err)
            }
        }
    }
}

// src/deployment/known.rs

//! Well-known deployment variable names
//!
//! Inputs are supplied by the caller; outputs are published by conventions
//! through [`VariableDictionary::set_output`](super::VariableDictionary::set_output).

/// Pipeline control flags
pub mod action {
    /// Set by a convention to stop the remaining install conventions
    pub const SKIP_REMAINING_CONVENTIONS: &str = "Outpost.Action.SkipRemainingConventions";
    /// Set by a convention to suppress the journal entry for this deployment
    pub const SKIP_JOURNAL: &str = "Outpost.Action.SkipJournal";
    pub const SUBSTITUTE_IN_FILES_ENABLED: &str = "Outpost.Action.SubstituteInFiles.Enabled";
    /// Log every variable at info level instead of debug
    pub const PRINT_VARIABLES: &str = "Outpost.Action.PrintVariables";
}

/// Package inputs and outputs
pub mod package {
    pub const PACKAGE_ID: &str = "Outpost.Action.Package.PackageId";
    pub const PACKAGE_VERSION: &str = "Outpost.Action.Package.PackageVersion";
    pub const CUSTOM_INSTALLATION_DIRECTORY: &str =
        "Outpost.Action.Package.CustomInstallationDirectory";
    pub const CUSTOM_INSTALLATION_DIRECTORY_SHOULD_BE_PURGED: &str =
        "Outpost.Action.Package.CustomInstallationDirectoryShouldBePurgedBeforeDeployment";
    /// Newline-separated glob patterns kept by the purge
    pub const CUSTOM_INSTALLATION_DIRECTORY_PURGE_EXCLUSIONS: &str =
        "Outpost.Action.Package.CustomInstallationDirectoryPurgeExclusions";
    pub const SKIP_IF_ALREADY_INSTALLED: &str = "Outpost.Action.Package.SkipIfAlreadyInstalled";
    pub const AUTOMATICALLY_UPDATE_SETTINGS: &str =
        "Outpost.Action.Package.AutomaticallyUpdateAppSettingsAndConnectionStrings";
    pub const TRANSFER_PATH: &str = "Outpost.Action.Package.TransferPath";
    pub const ORIGINAL_FILE_NAME: &str = "Outpost.Action.Package.OriginalFileName";

    /// Final installation directory (output)
    pub const INSTALLATION_DIRECTORY_PATH: &str =
        "Outpost.Action.Package.InstallationDirectoryPath";
    pub const EXTRACTED_FILE_COUNT: &str = "Package.ExtractedFileCount";
    pub const COPIED_FILE_COUNT: &str = "Package.CopiedFileCount";
    /// Transfer destination directory (output)
    pub const DIRECTORY_PATH: &str = "Package.DirectoryPath";
    pub const FILE_NAME: &str = "Package.FileName";
    pub const FILE_PATH: &str = "Package.FilePath";
}

/// Where the package was extracted before any relocation
pub const ORIGINAL_PACKAGE_DIRECTORY_PATH: &str = "Outpost.OriginalPackageDirectoryPath";

pub const RETENTION_POLICY_SET: &str = "Outpost.RetentionPolicySet";

pub mod environment {
    pub const ID: &str = "Outpost.Environment.Id";
    pub const NAME: &str = "Outpost.Environment.Name";
}

pub mod tenant {
    pub const ID: &str = "Outpost.Deployment.Tenant.Id";
    pub const NAME: &str = "Outpost.Deployment.Tenant.Name";
}

pub mod project {
    pub const ID: &str = "Outpost.Project.Id";
}

pub mod deployment {
    pub const ERROR: &str = "Outpost.Deployment.Error";
    pub const ERROR_DETAIL: &str = "Outpost.Deployment.ErrorDetail";
}

/// Agent-level settings and previous-installation details
pub mod agent {
    pub const APPLICATION_DIRECTORY_PATH: &str = "Outpost.Agent.ApplicationDirectoryPath";
    pub const CURRENT_PACKAGE_FILE_PATH: &str = "Outpost.Agent.CurrentDeployment.PackageFilePath";

    /// Variable names describing a previous installation
    pub struct PreviousInstallation {
        pub original_installed_path: &'static str,
        pub package_file_path: &'static str,
        pub package_version: &'static str,
        pub custom_installation_directory: &'static str,
    }

    /// The most recent installation, successful or not
    pub const PREVIOUS_INSTALLATION: PreviousInstallation = PreviousInstallation {
        original_installed_path: "Outpost.Agent.PreviousInstallation.OriginalInstalledPath",
        package_file_path: "Outpost.Agent.PreviousInstallation.PackageFilePath",
        package_version: "Outpost.Agent.PreviousInstallation.PackageVersion",
        custom_installation_directory: "Outpost.Agent.PreviousInstallation.CustomInstallationDirectory",
    };

    /// The most recent successful installation
    pub const PREVIOUS_SUCCESSFUL_INSTALLATION: PreviousInstallation = PreviousInstallation {
        original_installed_path: "Outpost.Agent.PreviousSuccessfulInstallation.OriginalInstalledPath",
        package_file_path: "Outpost.Agent.PreviousSuccessfulInstallation.PackageFilePath",
        package_version: "Outpost.Agent.PreviousSuccessfulInstallation.PackageVersion",
        custom_installation_directory:
            "Outpost.Agent.PreviousSuccessfulInstallation.CustomInstallationDirectory",
    };
}

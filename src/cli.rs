// src/cli.rs
//! CLI definitions for the Outpost deployment agent
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "outpost")]
#[command(author = "Outpost Contributors")]
#[command(version)]
#[command(about = "Deployment agent: extract packages, run conventions, keep an installation journal", long_about = None)]
pub struct Cli {
    /// Agent config file (default: $OUTPOST_HOME/agent.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Deployment variables supplied on the command line
#[derive(Args, Debug, Default)]
pub struct VariableArgs {
    /// JSON or TOML file of variables
    #[arg(long, value_name = "FILE")]
    pub variables: Option<PathBuf>,

    /// Set a variable, overriding the variables file (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract and install a package
    Deploy {
        /// Path to the package file
        package: PathBuf,

        #[command(flatten)]
        variables: VariableArgs,
    },

    /// Extract a package into a working directory and run its hooks there
    ///
    /// Nothing is placed under the application root and nothing is journaled.
    Stage {
        /// Path to the package file
        package: PathBuf,

        /// Working directory to extract into (default: current directory)
        #[arg(long, value_name = "DIR")]
        into: Option<PathBuf>,

        #[command(flatten)]
        variables: VariableArgs,
    },

    /// Copy a package file to a directory without extracting it
    Transfer {
        /// Path to the package file
        package: PathBuf,

        /// Destination directory
        #[arg(long, value_name = "DIR")]
        to: PathBuf,

        #[command(flatten)]
        variables: VariableArgs,
    },

    /// Query the installation journal
    #[command(subcommand)]
    Journal(JournalCommands),

    /// Remove old installations of a retention policy set
    Retention {
        /// Retention policy set to clean up
        #[arg(long)]
        policy_set: String,

        /// Keep installations from the last N days (0 keeps all)
        #[arg(long, conflicts_with = "releases", required_unless_present = "releases")]
        days: Option<u32>,

        /// Keep the current release and the previous N successful ones (0 keeps all)
        #[arg(long)]
        releases: Option<usize>,
    },

    /// Encode and decode cached package file names
    #[command(subcommand)]
    Package(PackageCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum JournalCommands {
    /// Show the latest installation for a policy set
    Latest {
        #[arg(long)]
        policy_set: String,

        /// Restrict to this package id
        #[arg(long, requires = "package_version")]
        package_id: Option<String>,

        /// Restrict to this package version
        #[arg(long, requires = "package_id")]
        package_version: Option<String>,

        /// Only consider successful installations
        #[arg(long)]
        successful: bool,
    },

    /// List journal entries
    List {
        /// Only entries for this policy set
        #[arg(long)]
        policy_set: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PackageCommands {
    /// Build a cached file name from a package identity
    Encode {
        id: String,
        version: String,
        /// File extension including the dot, e.g. `.zip`
        extension: String,

        /// Treat the version as a Maven version
        #[arg(long)]
        maven: bool,
    },

    /// Parse a package identity from a file name
    Decode {
        file: PathBuf,
    },
}

// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, JournalCommands, PackageCommands};
use clap_complete::generate;
use std::io;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Commands that need no agent state
    match &cli.command {
        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "outpost", &mut io::stdout());
            return Ok(());
        }
        Commands::Package(PackageCommands::Encode {
            id,
            version,
            extension,
            maven,
        }) => return commands::cmd_package_encode(id, version, extension, *maven),
        Commands::Package(PackageCommands::Decode { file }) => {
            return commands::cmd_package_decode(file);
        }
        _ => {}
    }

    let config = outpost::config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Deploy { package, variables } => {
            commands::cmd_deploy(&config, &package, &variables)
        }
        Commands::Stage {
            package,
            into,
            variables,
        } => commands::cmd_stage(&config, &package, into.as_deref(), &variables),
        Commands::Transfer {
            package,
            to,
            variables,
        } => commands::cmd_transfer(&config, &package, &to, &variables),
        Commands::Journal(JournalCommands::Latest {
            policy_set,
            package_id,
            package_version,
            successful,
        }) => {
            let package = package_id.as_deref().zip(package_version.as_deref());
            commands::cmd_journal_latest(&config, &policy_set, package, successful)
        }
        Commands::Journal(JournalCommands::List { policy_set }) => {
            commands::cmd_journal_list(&config, policy_set.as_deref())
        }
        Commands::Retention {
            policy_set,
            days,
            releases,
        } => commands::cmd_retention(&config, &policy_set, days, releases),
        Commands::Completions { .. } | Commands::Package(_) => Ok(()),
    }
}

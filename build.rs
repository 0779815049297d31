// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: agent config file
fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_name("FILE")
        .global(true)
        .help("Agent config file (default: $OUTPOST_HOME/agent.toml)")
}

/// Common argument: variables file
fn variables_arg() -> Arg {
    Arg::new("variables")
        .long("variables")
        .value_name("FILE")
        .help("JSON or TOML file of variables")
}

/// Common argument: single variable assignment
fn var_arg() -> Arg {
    Arg::new("var")
        .long("var")
        .value_name("NAME=VALUE")
        .action(ArgAction::Append)
        .help("Set a variable, overriding the variables file (repeatable)")
}

fn policy_set_arg() -> Arg {
    Arg::new("policy_set")
        .long("policy-set")
        .required(true)
        .help("Retention policy set")
}

fn build_cli() -> Command {
    Command::new("outpost")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Outpost Contributors")
        .about("Deployment agent: extract packages, run conventions, keep an installation journal")
        .arg(config_arg())
        .subcommand_required(true)
        .subcommand(
            Command::new("deploy")
                .about("Extract and install a package")
                .arg(Arg::new("package").required(true).help("Path to the package file"))
                .arg(variables_arg())
                .arg(var_arg()),
        )
        .subcommand(
            Command::new("stage")
                .about("Extract a package into a working directory and run its hooks there")
                .arg(Arg::new("package").required(true).help("Path to the package file"))
                .arg(
                    Arg::new("into")
                        .long("into")
                        .value_name("DIR")
                        .help("Working directory to extract into (default: current directory)"),
                )
                .arg(variables_arg())
                .arg(var_arg()),
        )
        .subcommand(
            Command::new("transfer")
                .about("Copy a package file to a directory without extracting it")
                .arg(Arg::new("package").required(true).help("Path to the package file"))
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("DIR")
                        .required(true)
                        .help("Destination directory"),
                )
                .arg(variables_arg())
                .arg(var_arg()),
        )
        .subcommand(
            Command::new("journal")
                .about("Query the installation journal")
                .subcommand_required(true)
                .subcommand(
                    Command::new("latest")
                        .about("Show the latest installation for a policy set")
                        .arg(policy_set_arg())
                        .arg(Arg::new("package_id").long("package-id").help("Restrict to this package id"))
                        .arg(
                            Arg::new("package_version")
                                .long("package-version")
                                .help("Restrict to this package version"),
                        )
                        .arg(
                            Arg::new("successful")
                                .long("successful")
                                .action(ArgAction::SetTrue)
                                .help("Only consider successful installations"),
                        ),
                )
                .subcommand(
                    Command::new("list").about("List journal entries").arg(
                        Arg::new("policy_set")
                            .long("policy-set")
                            .help("Only entries for this policy set"),
                    ),
                ),
        )
        .subcommand(
            Command::new("retention")
                .about("Remove old installations of a retention policy set")
                .arg(policy_set_arg())
                .arg(Arg::new("days").long("days").help("Keep installations from the last N days (0 keeps all)"))
                .arg(
                    Arg::new("releases")
                        .long("releases")
                        .help("Keep the current release and the previous N successful ones (0 keeps all)"),
                ),
        )
        .subcommand(
            Command::new("package")
                .about("Encode and decode cached package file names")
                .subcommand_required(true)
                .subcommand(
                    Command::new("encode")
                        .about("Build a cached file name from a package identity")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("version").required(true))
                        .arg(Arg::new("extension").required(true))
                        .arg(
                            Arg::new("maven")
                                .long("maven")
                                .action(ArgAction::SetTrue)
                                .help("Treat the version as a Maven version"),
                        ),
                )
                .subcommand(
                    Command::new("decode")
                        .about("Parse a package identity from a file name")
                        .arg(Arg::new("file").required(true)),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("outpost.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}

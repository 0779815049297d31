// src/commands/package.rs

use anyhow::Result;
use outpost::package::{self, PackageVersion};
use std::path::Path;

/// Print the cached file name for a package identity
pub fn cmd_package_encode(id: &str, version: &str, extension: &str, maven: bool) -> Result<()> {
    let version = if maven {
        PackageVersion::maven(version)?
    } else {
        PackageVersion::semver(version)?
    };
    println!("{}", package::to_cached_file_name(id, &version, extension)?);
    Ok(())
}

/// Print the identity parsed from a package file name
pub fn cmd_package_decode(file: &Path) -> Result<()> {
    let identity = package::from_file(file)?;
    println!("Id:        {}", identity.id);
    println!("Version:   {} ({})", identity.version, identity.version.format().name());
    println!("Extension: {}", identity.extension);
    Ok(())
}

// src/package/mod.rs

//! Package identity: file-name escaping, versions and the cached-name codec

pub mod escape;
pub mod name;
mod version;

pub use name::{PackageIdentity, extract_package_name_from_pathed_id, from_file, to_cached_file_name};
pub use version::{PackageVersion, VersionFormat};

// src/extraction/nupkg.rs

//! NuGet package extraction
//!
//! A `.nupkg` is an OPC container: a zip whose part names are
//! percent-encoded and which carries packaging metadata under
//! `package/services/metadata/`. That metadata is not deployable payload and
//! is left out. Entry timestamps are never restored for this format.

use super::zip_archive::{ZipOptions, extract_entries};
use super::{ArchiveFormat, PackageExtractor};
use crate::error::Result;
use std::path::Path;

const METADATA_PREFIX: &str = "package/services/metadata/";

/// Extracts `.nupkg` packages
#[derive(Debug, Default, Clone, Copy)]
pub struct NupkgExtractor;

impl PackageExtractor for NupkgExtractor {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Nupkg
    }

    fn extract(&self, package: &Path, target: &Path, _restore_timestamps: bool) -> Result<usize> {
        extract_entries(package, target, &ZipOptions {
            restore_timestamps: false,
            decode_names: true,
            skip: Some(is_package_metadata),
        })
    }
}

fn is_package_metadata(name: &str) -> bool {
    name.get(..METADATA_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(METADATA_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_is_package_metadata() {
        assert!(is_package_metadata("package/services/metadata/core-properties/x.psmdcp"));
        assert!(is_package_metadata("Package/Services/Metadata/a"));
        assert!(!is_package_metadata("package/other.txt"));
        assert!(!is_package_metadata("lib/package/services/metadata/a"));
    }

    #[test]
    fn test_extract_skips_metadata_and_decodes_names() {
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("Acme.Web.1.0.0.nupkg");

        let mut zip = zip::ZipWriter::new(File::create(&package).unwrap());
        let options = SimpleFileOptions::default();
        for (name, data) in [
            ("Acme.Web.nuspec", "<package/>"),
            ("content/My%20Site/index.html", "<html/>"),
            ("package/services/metadata/core-properties/abc.psmdcp", "meta"),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();

        let target = temp.path().join("out");
        let count = NupkgExtractor.extract(&package, &target, true).unwrap();

        assert_eq!(count, 2);
        assert!(target.join("content/My Site/index.html").is_file());
        assert!(!target.join("package").exists());
        assert_eq!(fs::read_to_string(target.join("Acme.Web.nuspec")).unwrap(), "<package/>");
    }
}

// src/extraction/mod.rs

//! Package extraction registry
//!
//! Maps a package file name to a format-specific extractor. Dispatch is by
//! extension only, so it works for both cached (`id@Sversion@random.ext`) and
//! dotted (`id.version.ext`) file names without opening the file.

mod nupkg;
mod tarball;
mod zip_archive;

pub use nupkg::NupkgExtractor;
pub use tarball::TarExtractor;
pub use zip_archive::ZipExtractor;

use crate::compression::CompressionFormat;
use crate::error::{Error, Result};
use crate::package::{self, PackageIdentity};
use std::fs;
use std::path::Path;
use tracing::info;

/// Unpacks one archive format into a directory
pub trait PackageExtractor: Send + Sync {
    /// The format handled by this extractor
    fn format(&self) -> ArchiveFormat;

    /// Extract `package` into `target`, returning the number of files written
    ///
    /// Directories (including empty ones) are recreated. Symbolic links are
    /// skipped. Nested archives are written as ordinary files.
    fn extract(&self, package: &Path, target: &Path, restore_timestamps: bool) -> Result<usize>;
}

/// Supported package archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    Nupkg,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 5] = [
        ArchiveFormat::Zip,
        ArchiveFormat::Tar,
        ArchiveFormat::TarGz,
        ArchiveFormat::TarBz2,
        ArchiveFormat::Nupkg,
    ];

    /// File extensions recognized for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Zip => &[".zip"],
            Self::Tar => &[".tar"],
            Self::TarGz => &[".tar.gz", ".tgz"],
            Self::TarBz2 => &[".tar.bz2", ".tbz2"],
            Self::Nupkg => &[".nupkg"],
        }
    }

    /// Get a human-readable name for the format
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::Nupkg => "nupkg",
        }
    }

    /// Match the longest known extension at the end of a file name
    ///
    /// Cached names (`id@Sversion@buster.ext`) are matched as-is: the
    /// disambiguator is dot-free hex, so the name ends with exactly the
    /// extension [`package::from_file`] would parse, and dotted names end
    /// with their extension by construction.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        Self::ALL
            .iter()
            .flat_map(|format| format.extensions().iter().map(move |ext| (*format, *ext)))
            .filter(|(_, ext)| lower.ends_with(ext))
            .max_by_key(|(_, ext)| ext.len())
            .map(|(format, _)| format)
    }

    fn extractor(&self) -> Box<dyn PackageExtractor> {
        match self {
            Self::Zip => Box::new(ZipExtractor),
            Self::Tar => Box::new(TarExtractor::new(CompressionFormat::None)),
            Self::TarGz => Box::new(TarExtractor::new(CompressionFormat::Gzip)),
            Self::TarBz2 => Box::new(TarExtractor::new(CompressionFormat::Bzip2)),
            Self::Nupkg => Box::new(NupkgExtractor),
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves extractors for package files
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractorRegistry;

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Find the extractor for a package file
    ///
    /// Fails with [`Error::UnsupportedFormat`] naming the unknown extension, or
    /// [`Error::MissingExtension`] when the name has no extension at all.
    pub fn get_extractor(&self, package: impl AsRef<Path>) -> Result<Box<dyn PackageExtractor>> {
        let package = package.as_ref();
        let file_name = package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(format) = ArchiveFormat::from_file_name(&file_name) {
            return Ok(format.extractor());
        }

        let extension = package::from_file(&file_name)
            .map(|identity| identity.extension)
            .ok()
            .or_else(|| {
                file_name
                    .rfind('.')
                    .filter(|&dot| dot + 1 < file_name.len())
                    .map(|dot| file_name[dot..].to_string())
            });

        match extension {
            Some(extension) => Err(Error::UnsupportedFormat { file_name, extension }),
            None => Err(Error::MissingExtension(file_name)),
        }
    }

    /// Package identity derived from the file name alone
    pub fn get_metadata(&self, package: impl AsRef<Path>) -> Result<PackageIdentity> {
        package::from_file(package)
    }

    /// Extract a package into `target`, creating it first
    pub fn extract(&self, package: &Path, target: &Path, restore_timestamps: bool) -> Result<usize> {
        let extractor = self.get_extractor(package)?;
        fs::create_dir_all(target)?;

        info!(
            "Extracting {} package {} to {}",
            extractor.format(),
            package.display(),
            target.display()
        );
        let count = extractor.extract(package, target, restore_timestamps)?;
        info!("Extracted {} files", count);
        Ok(count)
    }
}

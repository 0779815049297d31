// src/extraction/tarball.rs

//! Tarball package extraction (`.tar`, `.tar.gz`, `.tar.bz2`)

use super::{ArchiveFormat, PackageExtractor};
use crate::compression::{self, CompressionFormat};
use crate::error::Result;
use crate::filesystem::path::{is_root_entry, safe_join, sanitize_entry_name};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tar::EntryType;
use tracing::{debug, info, warn};

/// Extracts tar packages through the matching decompressor
#[derive(Debug, Clone, Copy)]
pub struct TarExtractor {
    compression: CompressionFormat,
}

impl TarExtractor {
    pub fn new(compression: CompressionFormat) -> Self {
        Self { compression }
    }
}

impl PackageExtractor for TarExtractor {
    fn format(&self) -> ArchiveFormat {
        match self.compression {
            CompressionFormat::None => ArchiveFormat::Tar,
            CompressionFormat::Gzip => ArchiveFormat::TarGz,
            CompressionFormat::Bzip2 => ArchiveFormat::TarBz2,
        }
    }

    fn extract(&self, package: &Path, target: &Path, restore_timestamps: bool) -> Result<usize> {
        let mut reader = BufReader::new(File::open(package)?);

        // Trust the content over the extension when they disagree
        let compression = match CompressionFormat::from_magic_bytes(reader.fill_buf()?) {
            CompressionFormat::None => self.compression,
            detected => {
                if detected != self.compression {
                    warn!(
                        "{} is named as {} but contains {} data",
                        package.display(),
                        self.compression,
                        detected
                    );
                }
                detected
            }
        };

        let mut archive = tar::Archive::new(compression::create_decoder(reader, compression));
        archive.set_preserve_mtime(restore_timestamps);
        archive.set_overwrite(true);

        let mut count = 0;
        for entry in archive.entries()? {
            let mut entry = entry?;
            let entry_type = entry.header().entry_type();

            if entry_type.is_symlink() || entry_type.is_hard_link() {
                match describe_link(&entry) {
                    Ok(link) => info!("Skipping link entry {}", link),
                    Err(e) => warn!("Skipping unreadable link entry: {}", e),
                }
                continue;
            }

            let name = entry.path()?.to_string_lossy().into_owned();
            match entry_type {
                EntryType::Directory => {
                    if !is_root_entry(&name) {
                        fs::create_dir_all(safe_join(target, &name)?)?;
                    }
                    continue;
                }
                t if t.is_file() => {}
                other => {
                    debug!("Skipping {:?} entry {}", other, name);
                    continue;
                }
            }

            let destination = safe_join(target, &name)?;
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            entry.unpack(&destination)?;
            count += 1;
        }

        Ok(count)
    }
}

/// `name -> target` for a link entry, failing on names that could not be written
fn describe_link(entry: &tar::Entry<'_, impl Read>) -> Result<String> {
    let name = sanitize_entry_name(&entry.path()?.to_string_lossy())?;
    let target = entry
        .link_name()?
        .map(|t| t.display().to_string())
        .unwrap_or_default();
    Ok(format!("{} -> {}", name.display(), target))
}

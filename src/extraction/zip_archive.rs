// src/extraction/zip_archive.rs

//! Zip package extraction
//!
//! Also backs the nupkg extractor, which is a zip container with OPC
//! naming rules layered on top.

use super::{ArchiveFormat, PackageExtractor};
use crate::error::Result;
use crate::filesystem::path::{is_root_entry, safe_join};
use chrono::NaiveDate;
use filetime::FileTime;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{debug, info};

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Extracts `.zip` packages
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl PackageExtractor for ZipExtractor {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn extract(&self, package: &Path, target: &Path, restore_timestamps: bool) -> Result<usize> {
        extract_entries(package, target, &ZipOptions {
            restore_timestamps,
            ..ZipOptions::default()
        })
    }
}

/// Per-format adjustments to plain zip extraction
#[derive(Default)]
pub(super) struct ZipOptions {
    pub restore_timestamps: bool,
    /// Decode percent-encoded entry names
    pub decode_names: bool,
    /// Entries to leave out, by decoded name
    pub skip: Option<fn(&str) -> bool>,
}

pub(super) fn extract_entries(package: &Path, target: &Path, options: &ZipOptions) -> Result<usize> {
    let file = File::open(package)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    let mut count = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let raw_name = entry.name().to_string();
        let name = if options.decode_names {
            urlencoding::decode(&raw_name).unwrap_or(Cow::Borrowed(raw_name.as_str())).into_owned()
        } else {
            raw_name.clone()
        };

        if options.skip.is_some_and(|skip| skip(&name)) {
            debug!("Skipping package metadata entry {}", name);
            continue;
        }

        if entry.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
            info!("Skipping symbolic link {}", name);
            continue;
        }

        if entry.is_dir() && is_root_entry(&name) {
            continue;
        }

        let destination = safe_join(target, &name)?;
        if entry.is_dir() {
            fs::create_dir_all(&destination)?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        {
            let mut output = File::create(&destination)?;
            io::copy(&mut entry, &mut output)?;
        }

        if options.restore_timestamps
            && let Some(modified) = entry.last_modified().and_then(to_file_time)
        {
            filetime::set_file_mtime(&destination, modified)?;
        }

        count += 1;
    }

    Ok(count)
}

/// Zip timestamps carry no zone; they are applied as UTC
fn to_file_time(modified: zip::DateTime) -> Option<FileTime> {
    let timestamp = NaiveDate::from_ymd_opt(
        i32::from(modified.year()),
        u32::from(modified.month()),
        u32::from(modified.day()),
    )?
    .and_hms_opt(
        u32::from(modified.hour()),
        u32::from(modified.minute()),
        u32::from(modified.second()),
    )?
    .and_utc()
    .timestamp();
    Some(FileTime::from_unix_time(timestamp, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            match content {
                Some(data) => {
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(data).unwrap();
                }
                None => {
                    zip.add_directory(*name, options).unwrap();
                }
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_files_and_empty_directories() {
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("Acme.1.0.0.zip");
        write_zip(
            &package,
            &[
                ("web.config", Some(b"<configuration/>")),
                ("bin/", None),
                ("bin/Acme.dll", Some(b"MZ")),
                ("App_Data/", None),
                ("App_Data/cache/", None),
            ],
        );

        let target = temp.path().join("out");
        let count = ZipExtractor.extract(&package, &target, false).unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(target.join("bin/Acme.dll")).unwrap(), b"MZ");
        assert!(target.join("App_Data/cache").is_dir());
    }

    #[test]
    fn test_extract_restores_timestamps() {
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("Acme.1.0.0.zip");

        let mut zip = zip::ZipWriter::new(File::create(&package).unwrap());
        let modified = zip::DateTime::from_date_and_time(2011, 3, 4, 5, 6, 8).unwrap();
        zip.start_file("readme.txt", SimpleFileOptions::default().last_modified_time(modified))
            .unwrap();
        zip.write_all(b"hello").unwrap();
        zip.finish().unwrap();

        let target = temp.path().join("out");
        ZipExtractor.extract(&package, &target, true).unwrap();

        let metadata = fs::metadata(target.join("readme.txt")).unwrap();
        let mtime = FileTime::from_last_modification_time(&metadata);
        let expected = NaiveDate::from_ymd_opt(2011, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 8)
            .unwrap()
            .and_utc()
            .timestamp();
        assert_eq!(mtime.unix_seconds(), expected);
    }

    #[test]
    fn test_extract_skips_root_directory_entry() {
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("Acme.1.0.0.zip");
        write_zip(&package, &[("./", None), ("./index.html", Some(b"<html/>"))]);

        let target = temp.path().join("out");
        assert_eq!(ZipExtractor.extract(&package, &target, false).unwrap(), 1);
        assert!(target.join("index.html").is_file());
    }

    #[test]
    fn test_extract_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("Evil.1.0.0.zip");
        write_zip(&package, &[("../escaped.txt", Some(b"x"))]);

        let target = temp.path().join("out");
        assert!(ZipExtractor.extract(&package, &target, false).is_err());
        assert!(!temp.path().join("escaped.txt").exists());
    }
}

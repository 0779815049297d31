// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! Builds real package archives on disk and a throwaway agent layout
//! (journal, lock directory, application root, working directory).

#![allow(dead_code)]

use outpost::convention::{ConventionPipeline, ConventionRegistry, DeploymentHooks};
use outpost::deployment::{PackageDeployer, VariableDictionary, known};
use outpost::extraction::ExtractorRegistry;
use outpost::journal::DeploymentJournal;
use outpost::placement::DirectoryPlacement;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Files every fixture package contains
pub const PACKAGE_FILES: &[(&str, &[u8])] = &[
    ("index.html", b"<h1>hello</h1>"),
    ("bin/app.dll", b"binary"),
    ("config/settings.json", b"{\"debug\": false}"),
];

/// Write a zip package with `files` and an empty `logs/` directory
pub fn build_zip(path: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    writer.add_directory("logs/", options).unwrap();
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Write a nupkg with OPC metadata parts and a percent-encoded entry name
pub fn build_nupkg(path: &Path) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    let parts: &[(&str, &[u8])] = &[
        ("[Content_Types].xml", b"<Types/>"),
        ("_rels/.rels", b"<Relationships/>"),
        ("package/services/metadata/core-properties/abc.psmdcp", b"<coreProperties/>"),
        ("Acme.Web.nuspec", b"<package/>"),
        ("content/My%20Page.html", b"page"),
    ];
    for (name, content) in parts {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Compression applied to a tar fixture
#[derive(Debug, Clone, Copy)]
pub enum TarKind {
    Plain,
    Gzip,
    Bzip2,
}

/// Write a tar package with `files` plus a symlink entry that must be skipped
pub fn build_tar(path: &Path, kind: TarKind, files: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let writer: Box<dyn Write> = match kind {
        TarKind::Plain => Box::new(file),
        TarKind::Gzip => Box::new(flate2::write::GzEncoder::new(
            file,
            flate2::Compression::default(),
        )),
        TarKind::Bzip2 => Box::new(bzip2::write::BzEncoder::new(
            file,
            bzip2::Compression::default(),
        )),
    };

    let mut builder = tar::Builder::new(writer);
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_600_000_000);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }

    let mut link = tar::Header::new_gnu();
    link.set_entry_type(tar::EntryType::Symlink);
    link.set_size(0);
    link.set_mode(0o777);
    builder.append_link(&mut link, "current", "index.html").unwrap();

    // Finish the archive, then flush the compressor
    let mut writer = builder.into_inner().unwrap();
    writer.flush().unwrap();
}

/// Write a tar.gz the way `tar -czf pkg.tar.gz -C dir .` does: a leading
/// `./` directory entry and every name prefixed with `./`
pub fn build_dotted_tar_gz(path: &Path, files: &[(&str, &[u8])]) {
    let encoder = flate2::write::GzEncoder::new(
        File::create(path).unwrap(),
        flate2::Compression::default(),
    );
    let mut builder = tar::Builder::new(encoder);

    // The builder normalizes `./` away, so names are written into the header directly
    let raw = |name: &str, entry_type: tar::EntryType, size: u64| {
        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(entry_type);
        header.set_mode(0o755);
        header.set_size(size);
        header.set_mtime(1_600_000_000);
        header.set_cksum();
        header
    };

    builder
        .append(&raw("./", tar::EntryType::Directory, 0), std::io::empty())
        .unwrap();
    for (name, content) in files {
        let header = raw(
            &format!("./{}", name),
            tar::EntryType::Regular,
            content.len() as u64,
        );
        builder.append(&header, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Relative paths of every file below `root`, sorted
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// A self-contained agent layout inside a temp directory
pub struct Agent {
    pub temp: TempDir,
    pub journal: Arc<DeploymentJournal>,
    pub apps: PathBuf,
    pub locks: PathBuf,
    pub work: PathBuf,
    pub packages: PathBuf,
}

impl Agent {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let apps = temp.path().join("Applications");
        let locks = temp.path().join("locks");
        let work = temp.path().join("work");
        let packages = temp.path().join("packages");
        fs::create_dir_all(&work).unwrap();
        fs::create_dir_all(&packages).unwrap();
        let journal =
            Arc::new(DeploymentJournal::open(temp.path().join("DeploymentJournal.log")).unwrap());

        Self {
            temp,
            journal,
            apps,
            locks,
            work,
            packages,
        }
    }

    /// Build `<packages>/<file_name>` as a zip of [`PACKAGE_FILES`]
    pub fn zip_package(&self, file_name: &str) -> PathBuf {
        let path = self.packages.join(file_name);
        build_zip(&path, PACKAGE_FILES);
        path
    }

    /// Baseline variables: application root and policy set
    pub fn variables(&self, policy_set: &str) -> VariableDictionary {
        [
            (
                known::agent::APPLICATION_DIRECTORY_PATH,
                self.apps.display().to_string(),
            ),
            (known::RETENTION_POLICY_SET, policy_set.to_string()),
        ]
        .into_iter()
        .collect()
    }

    pub fn placement(&self) -> DirectoryPlacement {
        DirectoryPlacement::for_applications(&self.locks, Duration::from_secs(30))
    }

    pub fn deployment_pipeline(&self, hooks: DeploymentHooks) -> ConventionPipeline {
        ConventionRegistry::package_deployment(
            Arc::clone(&self.journal),
            ExtractorRegistry::new(),
            self.placement(),
            hooks,
        )
    }

    pub fn deployer(&self, hooks: DeploymentHooks) -> PackageDeployer {
        PackageDeployer::new(
            Arc::clone(&self.journal),
            self.deployment_pipeline(hooks),
            &self.work,
        )
    }
}

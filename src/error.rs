// src/error.rs

//! Error types for the deployment agent

use std::io;
use thiserror::Error;

/// Errors raised by package handling, conventions, the journal and placement
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed package identity or cached file name
    #[error("Unexpected file format in {file_name}: {reason}")]
    Format { file_name: String, reason: String },

    #[error("Unsupported file extension '{extension}' for package {file_name}")]
    UnsupportedFormat { file_name: String, extension: String },

    #[error("Package {0} is missing a file extension")]
    MissingExtension(String),

    /// Generic convention failure; aborts the install pipeline
    #[error("{0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Journal error: {0}")]
    Journal(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn format(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::Io(e),
            other => Self::Archive(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, Error>;

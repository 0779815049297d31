// src/lib.rs

//! Outpost deployment agent
//!
//! Takes a package archive and a set of deployment variables, extracts the
//! package into a uniquely placed application directory, relocates it to a
//! custom installation directory when asked, and runs a pipeline of
//! installation steps (conventions) around that. Every deployment attempt is
//! recorded in an installation journal, which makes re-deployment idempotent
//! and drives retention clean-up.
//!
//! # Architecture
//!
//! - [`package`]: cached file name codec and file name escaping
//! - [`extraction`]: zip, tar, tar.gz, tar.bz2 and nupkg extractors
//! - [`deployment`]: the running deployment, its variables and the deployer
//! - [`convention`]: the install/rollback pipeline and the standard steps
//! - [`journal`]: append-only installation journal and retention
//! - [`placement`]: application directory placement under a named semaphore

pub mod compression;
pub mod config;
pub mod convention;
pub mod deployment;
mod error;
pub mod extraction;
pub mod filesystem;
pub mod journal;
pub mod package;
pub mod placement;

pub use error::{Error, Result};

// src/config.rs

//! Agent configuration
//!
//! Settings that belong to the machine rather than to a single deployment.
//! Loaded from TOML:
//!
//! ```toml
//! home = "/var/lib/outpost"
//! journal_path = "/var/lib/outpost/DeploymentJournal.log"
//! lock_directory = "/run/outpost"
//! lock_timeout_secs = 120
//! application_directory = "/srv/applications"
//! ```
//!
//! Every key is optional; unset paths are derived from `home`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Overrides the agent home directory
pub const HOME_ENV: &str = "OUTPOST_HOME";

/// Config file name looked up inside the home directory
pub const CONFIG_FILE_NAME: &str = "agent.toml";

const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub home: Option<PathBuf>,
    pub journal_path: Option<PathBuf>,
    pub lock_directory: Option<PathBuf>,
    pub lock_timeout_secs: Option<u64>,
    /// Root for application directories when the deployment does not set one
    pub application_directory: Option<PathBuf>,
}

impl AgentConfig {
    pub fn home(&self) -> PathBuf {
        self.home.clone().unwrap_or_else(default_home)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.journal_path
            .clone()
            .unwrap_or_else(|| self.home().join("DeploymentJournal.log"))
    }

    pub fn lock_directory(&self) -> PathBuf {
        self.lock_directory
            .clone()
            .unwrap_or_else(|| self.home().join("locks"))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs.unwrap_or(DEFAULT_LOCK_TIMEOUT_SECS))
    }
}

/// Default home: the platform data directory, else `~/.outpost`
pub fn default_home() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("outpost"))
        .or_else(|| dirs::home_dir().map(|h| h.join(".outpost")))
        .unwrap_or_else(|| PathBuf::from(".outpost"))
}

/// Load the agent config
///
/// An explicit `path` must exist. Otherwise `agent.toml` in `$OUTPOST_HOME`
/// (or the default home) is used when present, and defaults when not.
pub fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    let env_home = std::env::var_os(HOME_ENV)
        .filter(|h| !h.is_empty())
        .map(PathBuf::from);
    load_config_with_home(path, env_home)
}

fn load_config_with_home(path: Option<&Path>, env_home: Option<PathBuf>) -> Result<AgentConfig> {
    let home = env_home.unwrap_or_else(default_home);

    let mut config = match path {
        Some(path) => parse_config_file(path)?,
        None => {
            let candidate = home.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                parse_config_file(&candidate)?
            } else {
                debug!("No agent config at {}, using defaults", candidate.display());
                AgentConfig::default()
            }
        }
    };

    config.home.get_or_insert(home);
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<AgentConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config: AgentConfig = toml::from_str(&content)?;
    debug!("Loaded agent config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_derive_from_home() {
        let temp = TempDir::new().unwrap();
        let config = load_config_with_home(None, Some(temp.path().to_path_buf())).unwrap();

        assert_eq!(config.home(), temp.path());
        assert_eq!(config.journal_path(), temp.path().join("DeploymentJournal.log"));
        assert_eq!(config.lock_directory(), temp.path().join("locks"));
        assert_eq!(config.lock_timeout(), Duration::from_secs(60));
        assert_eq!(config.application_directory, None);
    }

    #[test]
    fn test_config_in_home_is_used() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "lock_timeout_secs = 5\napplication_directory = \"/srv/apps\"\n",
        )
        .unwrap();

        let config = load_config_with_home(None, Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(config.lock_timeout(), Duration::from_secs(5));
        assert_eq!(config.application_directory, Some(PathBuf::from("/srv/apps")));
        assert_eq!(config.home(), temp.path());
    }

    #[test]
    fn test_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, "home = \"/opt/outpost\"\njournal_path = \"/tmp/j.log\"\n").unwrap();

        let config = load_config_with_home(Some(&path), None).unwrap();
        assert_eq!(config.home(), PathBuf::from("/opt/outpost"));
        assert_eq!(config.journal_path(), PathBuf::from("/tmp/j.log"));
        assert_eq!(config.lock_directory(), PathBuf::from("/opt/outpost/locks"));

        let missing = load_config_with_home(Some(&temp.path().join("nope.toml")), None);
        assert!(matches!(missing, Err(Error::Config(_))));

        fs::write(&path, "unknown_key = 1\n").unwrap();
        assert!(matches!(
            load_config_with_home(Some(&path), None),
            Err(Error::Config(_))
        ));
    }
}

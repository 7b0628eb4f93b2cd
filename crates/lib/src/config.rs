//! Runtime configuration.
//!
//! Configuration is resolved once at startup and passed by value into every
//! component. The file format is JSON; every key is optional and falls back
//! to the defaults below.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Config file looked up in the current directory when none is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "config.json";

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "PKGRELAY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid branch '{0}' (expected one of: canary, ptb, stable)")]
  InvalidBranch(String),

  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid config value for '{key}': {message}")]
  Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// GPG key id used for detached signatures and the signed database.
  pub signing_key: Option<String>,
  /// Repository directory receiving published artifacts.
  pub repo_location: PathBuf,
  /// Database name; the index file is `<repo_name>.db.tar.gz`.
  pub repo_name: String,
  /// Directory holding the `PKGBUILD.<branch>` templates.
  pub pkgbuild_dir: PathBuf,
  /// Root of the per-branch working directories.
  pub workdir: PathBuf,
  /// Directory holding the persistent state files.
  pub state_dir: PathBuf,
  /// Webhook endpoints notified at pipeline milestones, in order.
  pub webhooks: Vec<String>,
  /// Identity exported as `PACKAGER` to the build toolchain.
  pub packager: String,
  /// Base URL of the upstream update API.
  pub version_endpoint: String,
  /// Wall-clock limit, in seconds, for the checksum and build steps.
  pub build_timeout: u64,
  /// Seconds between cycles in daemon mode.
  pub interval: u64,
  pub checksum_command: String,
  pub build_command: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      signing_key: None,
      repo_location: PathBuf::from("repo"),
      repo_name: "discord".to_string(),
      pkgbuild_dir: PathBuf::from("pkgbuilds"),
      workdir: PathBuf::from(".workdir"),
      state_dir: PathBuf::from("."),
      webhooks: Vec::new(),
      packager: "pkgrelay <pkgrelay@localhost>".to_string(),
      version_endpoint: "https://discord.com/api/updates".to_string(),
      build_timeout: 300,
      interval: 60,
      checksum_command: "updpkgsums".to_string(),
      build_command: "extra-x86_64-build".to_string(),
    }
  }
}

impl Config {
  /// Resolve and load the configuration.
  ///
  /// Priority order:
  /// 1. Explicit path (must exist)
  /// 2. `$PKGRELAY_CONFIG` (must exist)
  /// 3. `./config.json` if present
  /// 4. Built-in defaults
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    if let Some(path) = explicit {
      return Self::from_file(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
      && !path.is_empty()
    {
      return Self::from_file(Path::new(&path));
    }

    let cwd_config = Path::new(DEFAULT_CONFIG_FILENAME);
    if cwd_config.exists() {
      return Self::from_file(cwd_config);
    }

    debug!("no config file found, using defaults");
    Ok(Self::default())
  }

  /// Load configuration from a specific file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        ConfigError::NotFound(path.to_path_buf())
      } else {
        ConfigError::Read {
          path: path.to_path_buf(),
          source: e,
        }
      }
    })?;

    let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;

    info!(path = %path.display(), "loaded config");
    debug!(?config, "configuration");
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.build_timeout == 0 {
      return Err(ConfigError::Invalid {
        key: "build_timeout",
        message: "must be greater than zero".to_string(),
      });
    }
    if self.interval == 0 {
      return Err(ConfigError::Invalid {
        key: "interval",
        message: "must be greater than zero".to_string(),
      });
    }
    if self.repo_name.is_empty() {
      return Err(ConfigError::Invalid {
        key: "repo_name",
        message: "must not be empty".to_string(),
      });
    }
    Ok(())
  }

  pub fn build_timeout(&self) -> Duration {
    Duration::from_secs(self.build_timeout)
  }

  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval)
  }

  /// File name of the repository database.
  pub fn database_filename(&self) -> String {
    format!("{}.db.tar.gz", self.repo_name)
  }
}

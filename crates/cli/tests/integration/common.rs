//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Upstream that refuses connections, so version checks find nothing.
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:1/api/updates";

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the config file, the
/// state files, the repository, the recipes and the working directories.
pub struct TestEnv {
  pub temp: TempDir,
  pub config_path: PathBuf,
}

impl TestEnv {
  pub fn new() -> Self {
    Self::with_config(json!({}))
  }

  /// Create an environment whose config is the sandbox defaults overlaid with `overrides`.
  pub fn with_config(overrides: Value) -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();

    let mut config = json!({
      "state_dir": root.join("state"),
      "repo_location": root.join("repo"),
      "workdir": root.join("work"),
      "pkgbuild_dir": root.join("pkgbuilds"),
      "version_endpoint": UNREACHABLE_ENDPOINT,
    });
    if let (Some(base), Some(extra)) = (config.as_object_mut(), overrides.as_object()) {
      for (key, value) in extra {
        base.insert(key.clone(), value.clone());
      }
    }

    let config_path = root.join("config.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    Self { temp, config_path }
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.root().join(relative)
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Write a state file (`.cache.json`, `.lockout.json`, ...).
  pub fn write_state(&self, filename: &str, value: Value) {
    self.write_file(&format!("state/{}", filename), &value.to_string());
  }

  /// Parse a state file; a missing file reads as `null`.
  pub fn read_state(&self, filename: &str) -> Value {
    read_json(&self.path("state").join(filename))
  }

  /// Get a Command for the pkgrelay binary pointed at this environment's config.
  pub fn pkgrelay_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("pkgrelay");
    cmd.current_dir(self.root());
    cmd.env_remove("PKGRELAY_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--config").arg(&self.config_path);
    cmd
  }
}

pub fn read_json(path: &Path) -> Value {
  match std::fs::read_to_string(path) {
    Ok(content) => serde_json::from_str(&content).unwrap(),
    Err(_) => Value::Null,
  }
}

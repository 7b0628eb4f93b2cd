//! Test doubles for the pipeline's capability traits.
//!
//! The fakes record every call so tests can assert on ordering, and can be
//! told to fail at a particular step.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tempfile::TempDir;

use crate::branch::Branch;
use crate::build::recipe::patch_recipe;
use crate::build::{BuildError, BuildStep, Toolchain};
use crate::config::Config;
use crate::consts::{RECIPE_FILENAME, SIGNATURE_SUFFIX};
use crate::execute::CommandError;
use crate::notify::{NotifyError, Notifier};
use crate::repo::RepoTools;
use crate::source::{SourceError, VersionSource};

/// Name the fake toolchain gives the package for `version`.
pub fn package_name(version: &str) -> String {
  format!("pkg-{}-1-x86_64.pkg.tar.zst", version)
}

/// A config rooted in `temp`, with a recipe template for every branch.
pub fn sandbox_config(temp: &TempDir) -> Config {
  let recipes = temp.path().join("pkgbuilds");
  std::fs::create_dir_all(&recipes).unwrap();
  for branch in Branch::ALL {
    std::fs::write(recipes.join(branch.recipe_template()), "pkgname=pkg\npkgver=0.0.1\npkgrel=1\n").unwrap();
  }
  Config {
    pkgbuild_dir: recipes,
    workdir: temp.path().join("work"),
    repo_location: temp.path().join("repo"),
    state_dir: temp.path().join("state"),
    ..Config::default()
  }
}

fn command_failed(cmd: &str, code: i32) -> CommandError {
  CommandError::Failed {
    cmd: cmd.to_string(),
    code: Some(code),
    stderr: String::new(),
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainFailure {
  #[default]
  Never,
  Checksums,
  ChecksumsTimeout,
  Build,
  /// Report success without producing a package.
  NoArtifact,
}

#[derive(Debug, Default)]
pub struct FakeToolchain {
  pub failure: ToolchainFailure,
  version: Mutex<Option<String>>,
  calls: Mutex<Vec<String>>,
}

impl FakeToolchain {
  pub fn failing(failure: ToolchainFailure) -> Self {
    Self {
      failure,
      ..Default::default()
    }
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Number of times any toolchain step was invoked.
  pub fn invocations(&self) -> usize {
    self.calls.lock().unwrap().len()
  }

  fn record(&self, call: String) {
    self.calls.lock().unwrap().push(call);
  }
}

impl Toolchain for FakeToolchain {
  async fn patch_version(&self, work_dir: &Path, version: &str) -> Result<(), BuildError> {
    self.record(format!("patch {}", version));
    patch_recipe(&work_dir.join(RECIPE_FILENAME), version).await?;
    *self.version.lock().unwrap() = Some(version.to_string());
    Ok(())
  }

  async fn refresh_checksums(&self, _work_dir: &Path) -> Result<(), BuildError> {
    self.record("checksums".to_string());
    match self.failure {
      ToolchainFailure::Checksums => Err(BuildError::step(
        BuildStep::RefreshChecksums,
        command_failed("updpkgsums", 1),
      )),
      ToolchainFailure::ChecksumsTimeout => Err(BuildError::step(
        BuildStep::RefreshChecksums,
        CommandError::TimedOut {
          cmd: "updpkgsums".to_string(),
          timeout: Duration::from_secs(300),
        },
      )),
      _ => Ok(()),
    }
  }

  async fn build(&self, work_dir: &Path, packager: &str) -> Result<(), BuildError> {
    self.record(format!("build {}", packager));
    match self.failure {
      ToolchainFailure::Build => Err(BuildError::step(BuildStep::Package, command_failed("extra-x86_64-build", 255))),
      ToolchainFailure::NoArtifact => Ok(()),
      _ => {
        let version = self.version.lock().unwrap().clone().unwrap_or_default();
        std::fs::write(work_dir.join(package_name(&version)), version.as_bytes()).unwrap();
        Ok(())
      }
    }
  }
}

#[derive(Debug, Default)]
pub struct FakeRepoTools {
  pub fail_sign: bool,
  pub fail_database: bool,
  calls: Mutex<Vec<String>>,
}

impl FakeRepoTools {
  pub fn failing_sign() -> Self {
    Self {
      fail_sign: true,
      ..Default::default()
    }
  }

  pub fn failing_database() -> Self {
    Self {
      fail_database: true,
      ..Default::default()
    }
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }
}

impl RepoTools for FakeRepoTools {
  async fn sign(&self, repo_dir: &Path, filename: &str, key: &str) -> Result<(), CommandError> {
    self.calls.lock().unwrap().push(format!("sign {} {}", key, filename));
    if self.fail_sign {
      return Err(command_failed("gpg", 2));
    }
    std::fs::write(repo_dir.join(format!("{}{}", filename, SIGNATURE_SUFFIX)), b"sig").unwrap();
    Ok(())
  }

  async fn add_to_database(
    &self,
    repo_dir: &Path,
    database: &str,
    filename: &str,
    key: Option<&str>,
  ) -> Result<(), CommandError> {
    self
      .calls
      .lock()
      .unwrap()
      .push(format!("repo-add {:?} {} {}", key, database, filename));
    if self.fail_database {
      return Err(command_failed("repo-add", 1));
    }
    // repo-add keeps the previous database around as *.old
    let db = repo_dir.join(database);
    if db.exists() {
      std::fs::rename(&db, repo_dir.join(format!("{}.old", database))).unwrap();
    }
    std::fs::write(&db, filename.as_bytes()).unwrap();
    Ok(())
  }
}

#[derive(Debug, Default)]
pub struct FakeSource {
  versions: Mutex<HashMap<Branch, String>>,
  queries: Mutex<Vec<Branch>>,
}

impl FakeSource {
  pub fn with(versions: &[(Branch, &str)]) -> Self {
    let source = Self::default();
    for (branch, version) in versions {
      source.set(*branch, version);
    }
    source
  }

  pub fn set(&self, branch: Branch, version: &str) {
    self.versions.lock().unwrap().insert(branch, version.to_string());
  }

  pub fn queries(&self) -> Vec<Branch> {
    self.queries.lock().unwrap().clone()
  }
}

impl VersionSource for FakeSource {
  async fn current_version(&self, branch: Branch) -> Result<String, SourceError> {
    self.queries.lock().unwrap().push(branch);
    let found = self.versions.lock().unwrap().get(&branch).cloned();
    found.ok_or(SourceError::Status {
      url: format!("fake://{}", branch),
      status: 503,
    })
  }
}

#[derive(Debug, Default)]
pub struct FakeNotifier {
  pub fail: bool,
  messages: Mutex<Vec<String>>,
}

impl FakeNotifier {
  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Default::default()
    }
  }

  pub fn messages(&self) -> Vec<String> {
    self.messages.lock().unwrap().clone()
  }
}

impl Notifier for FakeNotifier {
  async fn send(&self, message: &str) -> Result<(), NotifyError> {
    self.messages.lock().unwrap().push(message.to_string());
    if self.fail {
      return Err(NotifyError::Status {
        endpoint: "fake://hook".to_string(),
        status: 500,
      });
    }
    Ok(())
  }
}

/// An HTTP endpoint that accepts connections and never answers.
pub async fn stalled_endpoint() -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    let mut open = Vec::new();
    while let Ok((socket, _)) = listener.accept().await {
      open.push(socket);
    }
  });
  format!("http://{}/stalled", addr)
}

/// Write a file with `content`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> PathBuf {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(path, content).unwrap();
  path.to_path_buf()
}

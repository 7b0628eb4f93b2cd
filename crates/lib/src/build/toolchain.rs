//! The external package toolchain.
//!
//! [`Toolchain`] is the seam between build sequencing and the programs that
//! actually do the work, so the orchestrator can run against a fake.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::build::recipe::patch_recipe;
use crate::build::types::{BuildError, BuildStep};
use crate::config::Config;
use crate::consts::RECIPE_FILENAME;
use crate::execute::{CommandSpec, run_command};

/// The three externally-driven steps of a build, all run inside the working directory.
pub trait Toolchain {
  /// Rewrite the recipe's `pkgver=` to `version`.
  fn patch_version(&self, work_dir: &Path, version: &str) -> impl Future<Output = Result<(), BuildError>> + Send;

  /// Recompute the recipe's source checksums.
  fn refresh_checksums(&self, work_dir: &Path) -> impl Future<Output = Result<(), BuildError>> + Send;

  /// Build the package with `packager` as the recorded identity.
  fn build(&self, work_dir: &Path, packager: &str) -> impl Future<Output = Result<(), BuildError>> + Send;
}

/// Arch Linux tooling: `updpkgsums` and a devtools clean-chroot build by default.
#[derive(Debug, Clone)]
pub struct MakepkgToolchain {
  checksum_command: String,
  build_command: String,
  timeout: Duration,
}

impl MakepkgToolchain {
  pub fn new(checksum_command: impl Into<String>, build_command: impl Into<String>, timeout: Duration) -> Self {
    Self {
      checksum_command: checksum_command.into(),
      build_command: build_command.into(),
      timeout,
    }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(
      config.checksum_command.clone(),
      config.build_command.clone(),
      config.build_timeout(),
    )
  }
}

impl Toolchain for MakepkgToolchain {
  async fn patch_version(&self, work_dir: &Path, version: &str) -> Result<(), BuildError> {
    patch_recipe(&work_dir.join(RECIPE_FILENAME), version).await?;
    Ok(())
  }

  async fn refresh_checksums(&self, work_dir: &Path) -> Result<(), BuildError> {
    let spec = CommandSpec::shell(&self.checksum_command, work_dir).timeout(self.timeout);
    run_command(&spec)
      .await
      .map_err(|e| BuildError::step(BuildStep::RefreshChecksums, e))?;
    Ok(())
  }

  async fn build(&self, work_dir: &Path, packager: &str) -> Result<(), BuildError> {
    let spec = CommandSpec::shell(&self.build_command, work_dir)
      .env("PACKAGER", packager)
      .timeout(self.timeout);
    run_command(&spec)
      .await
      .map_err(|e| BuildError::step(BuildStep::Package, e))?;
    Ok(())
  }
}

//! Build step sequencing.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info};

use crate::branch::Branch;
use crate::build::toolchain::Toolchain;
use crate::build::types::BuildError;
use crate::config::Config;
use crate::consts::{ARTIFACT_SUFFIX, RECIPE_FILENAME};

/// Runs one build attempt for a branch inside a freshly created working directory.
#[derive(Debug, Clone)]
pub struct BuildOrchestrator<T> {
  toolchain: T,
  work_root: PathBuf,
  recipe_dir: PathBuf,
  packager: String,
}

impl<T: Toolchain> BuildOrchestrator<T> {
  pub fn new(config: &Config, toolchain: T) -> Self {
    Self {
      toolchain,
      work_root: config.workdir.clone(),
      recipe_dir: config.pkgbuild_dir.clone(),
      packager: config.packager.clone(),
    }
  }

  pub fn toolchain(&self) -> &T {
    &self.toolchain
  }

  pub fn work_dir(&self, branch: Branch) -> PathBuf {
    self.work_root.join(branch.as_str())
  }

  /// Build `version` for `branch` and return the path of the produced package.
  ///
  /// Any failing step stops the build; the working directory is left as-is
  /// for inspection until the next attempt recreates it.
  pub async fn build(&self, branch: Branch, version: &str) -> Result<PathBuf, BuildError> {
    info!(%branch, version, "building package");

    let work_dir = self.work_dir(branch);
    self.prepare(branch, &work_dir).await?;

    debug!(%branch, "replacing version in recipe");
    if let Err(e) = self.toolchain.patch_version(&work_dir, version).await {
      error!(%branch, version, error = %e, "could not replace version in recipe");
      return Err(e);
    }

    debug!(%branch, "updating checksums");
    if let Err(e) = self.toolchain.refresh_checksums(&work_dir).await {
      error!(%branch, version, error = %e, "could not update checksums");
      return Err(e);
    }

    debug!(%branch, "building package");
    if let Err(e) = self.toolchain.build(&work_dir, &self.packager).await {
      error!(%branch, version, error = %e, "could not build package");
      return Err(e);
    }

    let artifact = find_artifact(&work_dir).inspect_err(|e| {
      error!(%branch, version, error = %e, "build produced no usable package");
    })?;

    info!(%branch, version, artifact = %artifact.display(), "package built successfully");
    Ok(artifact)
  }

  /// Recreate the working directory and copy the branch recipe into it.
  async fn prepare(&self, branch: Branch, work_dir: &Path) -> Result<(), BuildError> {
    match fs::remove_dir_all(work_dir).await {
      Ok(()) => debug!(path = %work_dir.display(), "removed existing working directory"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(source) => {
        return Err(BuildError::Prepare {
          path: work_dir.to_path_buf(),
          source,
        });
      }
    }

    fs::create_dir_all(work_dir).await.map_err(|source| BuildError::Prepare {
      path: work_dir.to_path_buf(),
      source,
    })?;

    let template = self.recipe_dir.join(branch.recipe_template());
    if !template.is_file() {
      error!(%branch, path = %template.display(), "recipe template missing");
      return Err(BuildError::RecipeMissing(template));
    }

    let recipe = work_dir.join(RECIPE_FILENAME);
    debug!(from = %template.display(), to = %recipe.display(), "copying recipe to working directory");
    fs::copy(&template, &recipe).await.map_err(|source| BuildError::Prepare {
      path: recipe.clone(),
      source,
    })?;

    Ok(())
  }
}

/// Find the single package file in `dir`.
pub fn find_artifact(dir: &Path) -> Result<PathBuf, BuildError> {
  let entries = std::fs::read_dir(dir).map_err(|source| BuildError::Prepare {
    path: dir.to_path_buf(),
    source,
  })?;

  let mut found: Vec<String> = entries
    .flatten()
    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
    .filter_map(|e| e.file_name().into_string().ok())
    .filter(|name| name.ends_with(ARTIFACT_SUFFIX))
    .collect();
  found.sort();

  match found.len() {
    0 => Err(BuildError::ArtifactMissing(dir.to_path_buf())),
    1 => Ok(dir.join(&found[0])),
    _ => Err(BuildError::AmbiguousArtifact {
      dir: dir.to_path_buf(),
      found,
    }),
  }
}

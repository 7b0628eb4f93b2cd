use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::build::recipe::RecipeError;
use crate::execute::CommandError;

/// The externally executed steps of a build. Version patching runs
/// in-process and fails with [`BuildError::Recipe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
  RefreshChecksums,
  Package,
}

impl fmt::Display for BuildStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildStep::RefreshChecksums => f.write_str("refresh checksums"),
      BuildStep::Package => f.write_str("build package"),
    }
  }
}

#[derive(Debug, Error)]
pub enum BuildError {
  /// Creating the working directory or copying the recipe failed.
  #[error("failed to prepare {path}: {source}")]
  Prepare {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("recipe template not found: {0}")]
  RecipeMissing(PathBuf),

  #[error("could not replace version in recipe: {0}")]
  Recipe(#[from] RecipeError),

  #[error("{step} failed: {source}")]
  Step {
    step: BuildStep,
    #[source]
    source: CommandError,
  },

  /// The toolchain reported success but left no package behind.
  #[error("build reported success but no package was produced in {0}")]
  ArtifactMissing(PathBuf),

  #[error("build produced more than one package in {dir}: {}", .found.join(", "))]
  AmbiguousArtifact { dir: PathBuf, found: Vec<String> },
}

impl BuildError {
  pub fn step(step: BuildStep, source: CommandError) -> Self {
    BuildError::Step { step, source }
  }

  pub fn is_timeout(&self) -> bool {
    matches!(self, BuildError::Step { source, .. } if source.is_timeout())
  }
}

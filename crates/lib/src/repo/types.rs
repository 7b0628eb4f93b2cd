use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::execute::CommandError;

#[derive(Debug, Error)]
pub enum PublishError {
  #[error("artifact path has no usable file name: {0}")]
  InvalidArtifact(PathBuf),

  #[error("failed to create repository directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to copy {from} to {to}: {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("could not sign {filename}: {source}")]
  Sign {
    filename: String,
    #[source]
    source: CommandError,
  },

  #[error("could not add {filename} to the repository database: {source}")]
  Database {
    filename: String,
    #[source]
    source: CommandError,
  },

  /// Moving, removing or listing files in the repository failed.
  #[error("failed to update {path}: {source}")]
  Fs {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

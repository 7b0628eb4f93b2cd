use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::branch::Branch;
use crate::notify::NotifyError;
use crate::repo::PublishError;
use crate::state::StateError;

/// Why a cycle ended without building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoUpdateReason {
  /// The branch is locked; nothing was fetched.
  Locked,
  /// Upstream matches the recorded version.
  UpToDate,
  /// Upstream could not be queried this cycle.
  SourceUnavailable,
}

/// How one cycle for one branch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
  NoUpdate { reason: NoUpdateReason },
  /// The build failed and the branch is now locked.
  LockedOut { version: String },
  Published {
    version: String,
    artifact: String,
    /// The previous artifact, when one was moved into the archive.
    archived: Option<String>,
  },
}

impl CycleOutcome {
  pub fn no_update(reason: NoUpdateReason) -> Self {
    Self::NoUpdate { reason }
  }
}

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  State(#[from] StateError),

  #[error("notification failed: {0}")]
  Notify(#[from] NotifyError),

  #[error("failed to create HTTP client: {0}")]
  Http(#[from] reqwest::Error),

  /// Publishing failed after a successful build. The repository was rolled back.
  #[error("publishing {branch} {version} failed: {source}")]
  Publish {
    branch: Branch,
    version: String,
    #[source]
    source: PublishError,
    /// Whether a previously archived artifact was put back.
    restored: bool,
  },

  #[error("failed to remove working directory {path}: {source}")]
  Clean {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Results of one pass over every branch.
#[derive(Debug, Default)]
pub struct CycleReport {
  pub results: Vec<(Branch, Result<CycleOutcome, PipelineError>)>,
}

impl CycleReport {
  pub fn failures(&self) -> impl Iterator<Item = (Branch, &PipelineError)> {
    self
      .results
      .iter()
      .filter_map(|(branch, result)| result.as_ref().err().map(|e| (*branch, e)))
  }

  pub fn has_failures(&self) -> bool {
    self.failures().next().is_some()
  }

  pub fn published(&self) -> usize {
    self
      .results
      .iter()
      .filter(|(_, r)| matches!(r, Ok(CycleOutcome::Published { .. })))
      .count()
  }
}

/// What `clean` removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
  pub workdir_removed: bool,
  pub versions_cleared: bool,
}

pub(super) fn update_detected_message(branch: Branch, version: &str) -> String {
  format!("New {} version available: {}. Initiating build", branch, version)
}

pub(super) fn build_failed_message(branch: Branch, version: &str) -> String {
  format!(
    ":rotating_light: Build failed for {} and {}. Builds will not be attempted for this channel",
    branch, version
  )
}

pub(super) fn published_message(branch: Branch, version: &str) -> String {
  format!("{} {} built and added to repo", branch, version)
}

pub(super) fn publish_failed_message(branch: Branch, version: &str) -> String {
  format!(
    ":rotating_light: Publishing {} {} failed. The previous package was kept, the next check will retry",
    branch, version
  )
}

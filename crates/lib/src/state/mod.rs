//! Persistent pipeline state.
//!
//! # Storage Layout
//!
//! ```text
//! {state_dir}/
//! ├── .cache.json       # branch -> last published version
//! ├── .artifacts.json   # branch -> last published artifact file name
//! └── .lockout.json     # branch -> "active" | "locked"
//! ```

mod kv;
mod types;

use std::path::Path;

use serde::Serialize;
use tracing::info;

pub use kv::KvFile;
pub use types::{BranchStatus, StateError};

use crate::branch::Branch;

pub const VERSIONS_FILENAME: &str = ".cache.json";
pub const ARTIFACTS_FILENAME: &str = ".artifacts.json";
pub const LOCKOUT_FILENAME: &str = ".lockout.json";

/// The three persistent namespaces.
#[derive(Debug, Clone)]
pub struct StateStore {
  pub versions: KvFile<String>,
  pub artifacts: KvFile<String>,
  pub lockout: KvFile<BranchStatus>,
}

/// Everything the store knows about one branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchState {
  pub branch: Branch,
  pub version: Option<String>,
  pub artifact: Option<String>,
  pub status: Option<BranchStatus>,
}

impl BranchState {
  pub fn is_locked(&self) -> bool {
    self.status.is_some_and(BranchStatus::is_locked)
  }
}

impl StateStore {
  pub fn new(state_dir: &Path) -> Self {
    Self {
      versions: KvFile::new("version", state_dir.join(VERSIONS_FILENAME)),
      artifacts: KvFile::new("artifact", state_dir.join(ARTIFACTS_FILENAME)),
      lockout: KvFile::new("lockout", state_dir.join(LOCKOUT_FILENAME)),
    }
  }

  pub fn is_locked(&self, branch: Branch) -> Result<bool, StateError> {
    Ok(self.lockout.get(branch)?.is_some_and(BranchStatus::is_locked))
  }

  pub fn lock(&self, branch: Branch) -> Result<(), StateError> {
    info!(%branch, "locking branch");
    self.lockout.set(branch, BranchStatus::Locked)
  }

  /// Clear the lock on `branch`. Fails with `NotLocked` unless it is currently locked.
  pub fn unlock(&self, branch: Branch) -> Result<(), StateError> {
    if !self.is_locked(branch)? {
      return Err(StateError::NotLocked(branch));
    }
    info!(%branch, "unlocking branch");
    self.lockout.set(branch, BranchStatus::Active)
  }

  /// Record a successful publish.
  pub fn record_release(&self, branch: Branch, version: &str, artifact: &str) -> Result<(), StateError> {
    self.versions.set(branch, version.to_string())?;
    self.artifacts.set(branch, artifact.to_string())
  }

  pub fn branch_state(&self, branch: Branch) -> Result<BranchState, StateError> {
    Ok(BranchState {
      branch,
      version: self.versions.get(branch)?,
      artifact: self.artifacts.get(branch)?,
      status: self.lockout.get(branch)?,
    })
  }

  pub fn summary(&self) -> Result<Vec<BranchState>, StateError> {
    Branch::ALL.iter().map(|b| self.branch_state(*b)).collect()
  }
}

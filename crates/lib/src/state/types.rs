use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::branch::Branch;

/// Per-branch build status.
///
/// An absent record means the branch has never been locked or unlocked; it
/// behaves like `Active`. Written as `"active"` / `"locked"`; lockout files
/// from older deployments store `true` / `false` and are still read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
  Active,
  Locked,
}

impl<'de> Deserialize<'de> for BranchStatus {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Word {
      Active,
      Locked,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
      Word(Word),
      Flag(bool),
    }

    Ok(match Stored::deserialize(deserializer)? {
      Stored::Word(Word::Active) | Stored::Flag(false) => BranchStatus::Active,
      Stored::Word(Word::Locked) | Stored::Flag(true) => BranchStatus::Locked,
    })
  }
}

impl BranchStatus {
  pub fn is_locked(self) -> bool {
    matches!(self, BranchStatus::Locked)
  }
}

#[derive(Debug, Error)]
pub enum StateError {
  #[error("no {namespace} entry for branch {branch}")]
  NotFound { namespace: &'static str, branch: Branch },

  #[error("branch {0} is not locked")]
  NotLocked(Branch),

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize {namespace}: {source}")]
  Serialize {
    namespace: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

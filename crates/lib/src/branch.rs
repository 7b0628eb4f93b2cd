//! Release channels tracked by the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A release channel. The set is closed; every persistent namespace is keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
  Canary,
  Ptb,
  Stable,
}

impl Branch {
  /// Every branch, in the order a full cycle visits them.
  pub const ALL: [Branch; 3] = [Branch::Canary, Branch::Ptb, Branch::Stable];

  pub fn as_str(&self) -> &'static str {
    match self {
      Branch::Canary => "canary",
      Branch::Ptb => "ptb",
      Branch::Stable => "stable",
    }
  }

  /// File name of this branch's recipe template inside the recipe directory.
  pub fn recipe_template(&self) -> String {
    format!("PKGBUILD.{}", self.as_str())
  }
}

impl fmt::Display for Branch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Branch {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "canary" => Ok(Branch::Canary),
      "ptb" => Ok(Branch::Ptb),
      "stable" => Ok(Branch::Stable),
      other => Err(ConfigError::InvalidBranch(other.to_string())),
    }
  }
}

//! Signing and database tools.

use std::future::Future;
use std::path::Path;

use crate::execute::{CommandError, CommandSpec, run_command};

/// External programs the publisher drives, run inside the repository directory.
pub trait RepoTools {
  /// Write a detached signature `<filename>.sig` using `key`.
  fn sign(&self, repo_dir: &Path, filename: &str, key: &str) -> impl Future<Output = Result<(), CommandError>> + Send;

  /// Add `filename` to `database`, signing the database with `key` when given.
  fn add_to_database(
    &self,
    repo_dir: &Path,
    database: &str,
    filename: &str,
    key: Option<&str>,
  ) -> impl Future<Output = Result<(), CommandError>> + Send;
}

/// `gpg` for signatures and pacman's `repo-add` for the database.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpgRepoTools;

pub fn sign_command(repo_dir: &Path, filename: &str, key: &str) -> CommandSpec {
  CommandSpec::new("gpg", repo_dir).args([
    "--batch".to_string(),
    "--yes".to_string(),
    "--sign".to_string(),
    "--detach-sign".to_string(),
    format!("--default-key={}", key),
    filename.to_string(),
  ])
}

pub fn repo_add_command(repo_dir: &Path, database: &str, filename: &str, key: Option<&str>) -> CommandSpec {
  let mut spec = CommandSpec::new("repo-add", repo_dir);
  if let Some(key) = key {
    spec = spec.args(["-s", "-k", key]);
  }
  spec.args([database, filename])
}

impl RepoTools for GpgRepoTools {
  async fn sign(&self, repo_dir: &Path, filename: &str, key: &str) -> Result<(), CommandError> {
    run_command(&sign_command(repo_dir, filename, key)).await?;
    Ok(())
  }

  async fn add_to_database(
    &self,
    repo_dir: &Path,
    database: &str,
    filename: &str,
    key: Option<&str>,
  ) -> Result<(), CommandError> {
    run_command(&repo_add_command(repo_dir, database, filename, key)).await?;
    Ok(())
  }
}

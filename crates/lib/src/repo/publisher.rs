//! Publishing artifacts into the repository.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::consts::{ARCHIVE_DIR, SIGNATURE_SUFFIX, STALE_SUFFIX};
use crate::repo::tools::RepoTools;
use crate::repo::types::PublishError;

#[derive(Debug, Clone)]
pub struct RepoPublisher<R> {
  tools: R,
  repo_dir: PathBuf,
  database: String,
  signing_key: Option<String>,
}

fn signature_name(filename: &str) -> String {
  format!("{}{}", filename, SIGNATURE_SUFFIX)
}

fn fs_err(path: &Path) -> impl FnOnce(io::Error) -> PublishError + '_ {
  move |source| PublishError::Fs {
    path: path.to_path_buf(),
    source,
  }
}

/// Remove a file, treating absence as success. Returns whether it existed.
async fn remove_if_exists(path: &Path) -> Result<bool, PublishError> {
  match fs::remove_file(path).await {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(source) => Err(PublishError::Fs {
      path: path.to_path_buf(),
      source,
    }),
  }
}

impl<R: RepoTools> RepoPublisher<R> {
  pub fn new(config: &Config, tools: R) -> Self {
    Self {
      tools,
      repo_dir: config.repo_location.clone(),
      database: config.database_filename(),
      signing_key: config.signing_key.clone(),
    }
  }

  pub fn tools(&self) -> &R {
    &self.tools
  }

  pub fn repo_dir(&self) -> &Path {
    &self.repo_dir
  }

  pub fn archive_dir(&self) -> PathBuf {
    self.repo_dir.join(ARCHIVE_DIR)
  }

  /// Copy `artifact` into the repository, sign it when a key is configured,
  /// and add it to the database. Returns the published file name.
  ///
  /// A failure after the copy leaves the copied file in place; callers must
  /// treat the publish as failed regardless.
  pub async fn publish(&self, artifact: &Path) -> Result<String, PublishError> {
    let filename = artifact
      .file_name()
      .and_then(|n| n.to_str())
      .map(str::to_string)
      .ok_or_else(|| PublishError::InvalidArtifact(artifact.to_path_buf()))?;

    fs::create_dir_all(&self.repo_dir)
      .await
      .map_err(|source| PublishError::CreateDir {
        path: self.repo_dir.clone(),
        source,
      })?;

    let dest = self.repo_dir.join(&filename);
    debug!(from = %artifact.display(), to = %dest.display(), "copying package to repo");
    fs::copy(artifact, &dest).await.map_err(|source| PublishError::Copy {
      from: artifact.to_path_buf(),
      to: dest.clone(),
      source,
    })?;

    if let Some(key) = &self.signing_key {
      info!(filename, "signing package");
      let signature = self.repo_dir.join(signature_name(&filename));
      if remove_if_exists(&signature).await? {
        debug!(path = %signature.display(), "removed existing signature");
      }

      self
        .tools
        .sign(&self.repo_dir, &filename, key)
        .await
        .map_err(|source| {
          error!(filename, error = %source, "could not sign package");
          PublishError::Sign {
            filename: filename.clone(),
            source,
          }
        })?;
    }

    debug!(filename, database = %self.database, "updating repo database");
    self
      .tools
      .add_to_database(&self.repo_dir, &self.database, &filename, self.signing_key.as_deref())
      .await
      .map_err(|source| {
        error!(filename, error = %source, "could not add package to repo");
        PublishError::Database {
          filename: filename.clone(),
          source,
        }
      })?;

    info!(filename, repo = %self.repo_dir.display(), "package published");
    Ok(filename)
  }

  /// Move `filename` (and its signature) from the repository root into
  /// `archive/<filename>/`, replacing any earlier archive of the same name.
  ///
  /// Returns `false` when there was nothing to archive.
  pub async fn archive(&self, filename: &str) -> Result<bool, PublishError> {
    let current = self.repo_dir.join(filename);
    if !current.is_file() {
      debug!(filename, "nothing to archive");
      return Ok(false);
    }

    let target_dir = self.archive_dir().join(filename);
    match fs::remove_dir_all(&target_dir).await {
      Ok(()) => debug!(path = %target_dir.display(), "replacing previous archive"),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(source) => {
        return Err(PublishError::Fs {
          path: target_dir,
          source,
        });
      }
    }
    fs::create_dir_all(&target_dir).await.map_err(fs_err(&target_dir))?;

    let archived = target_dir.join(filename);
    fs::rename(&current, &archived).await.map_err(fs_err(&current))?;

    let signature = self.repo_dir.join(signature_name(filename));
    if signature.is_file() {
      let archived_sig = target_dir.join(signature_name(filename));
      fs::rename(&signature, &archived_sig).await.map_err(fs_err(&signature))?;
    }

    info!(filename, path = %target_dir.display(), "archived previous package");
    Ok(true)
  }

  /// Move an archived artifact (and its signature) back into the repository root.
  ///
  /// Returns `false` when no archive exists for `filename`.
  pub async fn restore(&self, filename: &str) -> Result<bool, PublishError> {
    let source_dir = self.archive_dir().join(filename);
    let archived = source_dir.join(filename);
    if !archived.is_file() {
      return Ok(false);
    }

    fs::create_dir_all(&self.repo_dir).await.map_err(fs_err(&self.repo_dir))?;
    fs::rename(&archived, self.repo_dir.join(filename))
      .await
      .map_err(fs_err(&archived))?;

    let archived_sig = source_dir.join(signature_name(filename));
    if archived_sig.is_file() {
      fs::rename(&archived_sig, self.repo_dir.join(signature_name(filename)))
        .await
        .map_err(fs_err(&archived_sig))?;
    }

    fs::remove_dir_all(&source_dir).await.map_err(fs_err(&source_dir))?;
    info!(filename, "restored archived package");
    Ok(true)
  }

  /// Remove `filename` and its signature from the repository root.
  pub async fn discard(&self, filename: &str) -> Result<(), PublishError> {
    remove_if_exists(&self.repo_dir.join(filename)).await?;
    remove_if_exists(&self.repo_dir.join(signature_name(filename))).await?;
    debug!(filename, "discarded partially published package");
    Ok(())
  }

  /// Delete every stale file (`*.old`, `*.old.sig`) in the repository root.
  ///
  /// Returns the removed file names, sorted.
  pub async fn prune_stale(&self) -> Result<Vec<String>, PublishError> {
    let stale_sig = format!("{}{}", STALE_SUFFIX, SIGNATURE_SUFFIX);
    let mut removed = Vec::new();

    let mut entries = match fs::read_dir(&self.repo_dir).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(removed),
      Err(source) => {
        return Err(PublishError::Fs {
          path: self.repo_dir.clone(),
          source,
        });
      }
    };

    while let Some(entry) = entries.next_entry().await.map_err(fs_err(&self.repo_dir))? {
      let Ok(name) = entry.file_name().into_string() else {
        continue;
      };
      if !(name.ends_with(STALE_SUFFIX) || name.ends_with(&stale_sig)) {
        continue;
      }
      let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
      if !is_file {
        continue;
      }

      let path = entry.path();
      fs::remove_file(&path).await.map_err(fs_err(&path))?;
      debug!(file = %name, "removed stale file");
      removed.push(name);
    }

    removed.sort();
    if !removed.is_empty() {
      info!(count = removed.len(), "pruned stale files");
    }
    Ok(removed)
  }
}

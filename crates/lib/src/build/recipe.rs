//! `PKGBUILD` version patching.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::debug;

const PKGVER_KEY: &str = "pkgver=";

#[derive(Debug, Error)]
pub enum RecipeError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("no pkgver= line in {0}")]
  NoVersionLine(PathBuf),

  #[error("'{0}' is not a valid pkgver")]
  InvalidVersion(String),
}

/// Check that `version` can stand as a `pkgver` value.
///
/// makepkg forbids hyphens, colons, slashes and whitespace in `pkgver`.
pub fn validate_version(version: &str) -> Result<(), RecipeError> {
  let invalid = version.is_empty()
    || version
      .chars()
      .any(|c| c.is_whitespace() || matches!(c, '-' | ':' | '/' | '\'' | '"' | '$' | '`'));
  if invalid {
    return Err(RecipeError::InvalidVersion(version.to_string()));
  }
  Ok(())
}

/// Replace the value of every `pkgver=` assignment in `content`.
///
/// Returns the patched text and the number of lines changed. Indentation
/// before the key is preserved.
pub fn replace_pkgver(content: &str, version: &str) -> (String, usize) {
  let mut replaced = 0;
  let mut out = String::with_capacity(content.len() + version.len());

  for line in content.split_inclusive('\n') {
    let body = line.trim_end_matches(['\n', '\r']);
    let ending = &line[body.len()..];
    let indent_len = body.len() - body.trim_start().len();

    if body[indent_len..].starts_with(PKGVER_KEY) {
      out.push_str(&body[..indent_len]);
      out.push_str(PKGVER_KEY);
      out.push_str(version);
      out.push_str(ending);
      replaced += 1;
    } else {
      out.push_str(line);
    }
  }

  (out, replaced)
}

/// Patch the recipe at `path` in place to `version`.
pub async fn patch_recipe(path: &Path, version: &str) -> Result<(), RecipeError> {
  validate_version(version)?;

  let content = fs::read_to_string(path).await.map_err(|source| RecipeError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let (patched, replaced) = replace_pkgver(&content, version);
  if replaced == 0 {
    return Err(RecipeError::NoVersionLine(path.to_path_buf()));
  }

  fs::write(path, patched).await.map_err(|source| RecipeError::Write {
    path: path.to_path_buf(),
    source,
  })?;

  debug!(path = %path.display(), version, replaced, "patched recipe version");
  Ok(())
}

//! A single JSON-backed namespace.
//!
//! The file holds a flat object keyed by branch name. Every write rewrites
//! the whole mapping through a temporary sibling that is renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use super::types::StateError;
use crate::branch::Branch;

#[derive(Debug, Clone)]
pub struct KvFile<V> {
  namespace: &'static str,
  path: PathBuf,
  _value: PhantomData<V>,
}

impl<V> KvFile<V>
where
  V: Serialize + DeserializeOwned + Clone,
{
  pub fn new(namespace: &'static str, path: PathBuf) -> Self {
    Self {
      namespace,
      path,
      _value: PhantomData,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Load the whole mapping. A missing file is an empty mapping.
  pub fn load(&self) -> Result<BTreeMap<Branch, V>, StateError> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
      Err(source) => {
        return Err(StateError::Read {
          path: self.path.clone(),
          source,
        });
      }
    };

    serde_json::from_str(&content).map_err(|source| StateError::Parse {
      path: self.path.clone(),
      source,
    })
  }

  fn save(&self, data: &BTreeMap<Branch, V>) -> Result<(), StateError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(|source| StateError::Write {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let content = serde_json::to_string_pretty(data).map_err(|source| StateError::Serialize {
      namespace: self.namespace,
      source,
    })?;

    let mut temp_name = self.path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, content).map_err(|source| StateError::Write {
      path: temp_path.clone(),
      source,
    })?;
    fs::rename(&temp_path, &self.path).map_err(|source| StateError::Write {
      path: self.path.clone(),
      source,
    })?;

    trace!(namespace = self.namespace, path = %self.path.display(), "saved");
    Ok(())
  }

  pub fn get(&self, branch: Branch) -> Result<Option<V>, StateError> {
    Ok(self.load()?.get(&branch).cloned())
  }

  pub fn set(&self, branch: Branch, value: V) -> Result<(), StateError> {
    let mut data = self.load()?;
    data.insert(branch, value);
    self.save(&data)
  }

  /// Remove the entry for `branch`; fails with `NotFound` if there is none.
  pub fn delete(&self, branch: Branch) -> Result<V, StateError> {
    let mut data = self.load()?;
    let removed = data.remove(&branch).ok_or(StateError::NotFound {
      namespace: self.namespace,
      branch,
    })?;
    self.save(&data)?;
    Ok(removed)
  }

  /// Remove the backing file. Returns whether it existed.
  pub fn clear(&self) -> Result<bool, StateError> {
    match fs::remove_file(&self.path) {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(source) => Err(StateError::Write {
        path: self.path.clone(),
        source,
      }),
    }
  }
}

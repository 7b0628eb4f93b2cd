//! Advisory lock on the state directory.
//!
//! Every state-mutating command, and each daemon cycle, holds the lock
//! exclusively so whole-file rewrites of the state and the repository never
//! interleave. `status` holds it shared. The exclusive holder writes who it is
//! into the lock file, so a refused caller can name the busy process.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rustix::fs::{FlockOperation, flock};
use rustix::io::Errno;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LOCK_FILENAME: &str = ".pkgrelay.lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
  Shared,
  Exclusive,
}

/// The process holding the exclusive lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
  pub command: String,
  pub pid: u32,
  pub started_at_unix: u64,
}

impl fmt::Display for LockHolder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}' (PID {})", self.command, self.pid)
  }
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error("{}", busy_message(.holder.as_ref(), .lock_path))]
  Busy {
    holder: Option<LockHolder>,
    lock_path: PathBuf,
  },

  #[error("failed to lock {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl LockError {
  pub fn is_busy(&self) -> bool {
    matches!(self, LockError::Busy { .. })
  }
}

fn busy_message(holder: Option<&LockHolder>, lock_path: &Path) -> String {
  let who = match holder {
    Some(holder) => format!("State is in use by {}", holder),
    None => "State is in use by another process".to_string(),
  };
  format!(
    "{}\nIf no pkgrelay process is running, remove the lock file:\n  {}",
    who,
    lock_path.display()
  )
}

/// Held for as long as the value lives; released on drop.
#[derive(Debug)]
pub struct StateLock {
  file: File,
  lock_path: PathBuf,
}

impl StateLock {
  /// Take the lock without blocking. `command` is recorded for exclusive holders.
  pub fn acquire(state_dir: &Path, mode: LockMode, command: &str) -> Result<Self, LockError> {
    let lock_path = state_dir.join(LOCK_FILENAME);
    let io_err = |source| LockError::Io {
      path: lock_path.clone(),
      source,
    };

    std::fs::create_dir_all(state_dir).map_err(io_err)?;
    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(io_err)?;

    let operation = match mode {
      LockMode::Shared => FlockOperation::NonBlockingLockShared,
      LockMode::Exclusive => FlockOperation::NonBlockingLockExclusive,
    };
    match flock(&file, operation) {
      Ok(()) => {}
      Err(e) if e == Errno::WOULDBLOCK => {
        return Err(LockError::Busy {
          holder: read_holder(&file).ok(),
          lock_path: lock_path.clone(),
        });
      }
      Err(e) => return Err(io_err(e.into())),
    }

    if mode == LockMode::Exclusive {
      write_holder(&file, command).map_err(io_err)?;
    }

    Ok(StateLock { file, lock_path })
  }

  /// Who last held the lock exclusively; for an exclusive lock, this process.
  pub fn holder(&self) -> io::Result<LockHolder> {
    read_holder(&self.file)
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

fn read_holder(mut file: &File) -> io::Result<LockHolder> {
  file.seek(SeekFrom::Start(0))?;
  let mut contents = String::new();
  file.read_to_string(&mut contents)?;
  serde_json::from_str(&contents).map_err(io::Error::other)
}

fn write_holder(mut file: &File, command: &str) -> io::Result<()> {
  let holder = LockHolder {
    command: command.to_string(),
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
  };

  file.set_len(0)?;
  file.seek(SeekFrom::Start(0))?;
  serde_json::to_writer(file, &holder).map_err(io::Error::other)?;
  file.flush()
}

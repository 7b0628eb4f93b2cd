//! Types for running external commands.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
  /// The process could not be started.
  #[error("failed to spawn `{cmd}`: {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// Waiting on the process failed.
  #[error("failed to wait for `{cmd}`: {source}")]
  Wait {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// The process exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed {
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The process exceeded its wall-clock limit and was killed.
  #[error("command timed out after {}: {cmd}", humanize(.timeout))]
  TimedOut { cmd: String, timeout: Duration },
}

impl CommandError {
  pub fn is_timeout(&self) -> bool {
    matches!(self, CommandError::TimedOut { .. })
  }
}

fn humanize(d: &Duration) -> String {
  if d.as_secs() > 0 {
    format!("{}s", d.as_secs())
  } else {
    format!("{}ms", d.as_millis())
  }
}

/// A fully described command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: PathBuf,
  /// Added on top of the inherited environment.
  pub env: BTreeMap<String, String>,
  /// Kill the process if it runs longer than this.
  pub timeout: Option<Duration>,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: cwd.to_path_buf(),
      env: BTreeMap::new(),
      timeout: None,
    }
  }

  /// A script run through the platform shell.
  pub fn shell(script: &str, cwd: &Path) -> Self {
    let (shell, args) = super::cmd::get_shell();
    Self::new(shell, cwd).args(args).arg(script)
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.program)?;
    for arg in &self.args {
      if arg.contains(char::is_whitespace) {
        write!(f, " '{}'", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
  pub stdout: String,
  pub stderr: String,
}

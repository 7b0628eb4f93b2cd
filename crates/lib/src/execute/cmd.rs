//! Process spawning with timeouts.
//!
//! Every command runs as the leader of its own process group. Build steps
//! fork deep trees (makechrootpkg, systemd-nspawn, curl), so a timeout kills
//! the whole group, and a Ctrl-C at the terminal only reaches pkgrelay.

use std::process::Stdio;
use std::time::Duration;

use rustix::process::{Pid, Signal, kill_process_group};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::types::{CommandError, CommandOutput, CommandSpec};

/// Lines of stderr kept in the log when a command fails.
const STDERR_TAIL_LINES: usize = 20;

/// How long to wait for a killed process group to be reaped.
const REAP_GRACE: Duration = Duration::from_secs(5);

/// Run a command to completion.
///
/// The child inherits the current environment plus `spec.env`. When
/// `spec.timeout` is set and elapses, the child's process group is killed and
/// [`CommandError::TimedOut`] is returned. A non-zero exit yields
/// [`CommandError::Failed`] carrying the captured stderr.
pub async fn run_command(spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
  let cmd_line = spec.to_string();
  info!(cmd = %cmd_line, cwd = %spec.cwd.display(), "executing command");

  let mut command = Command::new(&spec.program);
  command
    .args(&spec.args)
    .current_dir(&spec.cwd)
    .envs(&spec.env)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .process_group(0)
    .kill_on_drop(true);

  let child = command.spawn().map_err(|source| CommandError::Spawn {
    cmd: cmd_line.clone(),
    source,
  })?;
  let group = child.id().and_then(|id| Pid::from_raw(id as i32));

  let wait = child.wait_with_output();
  tokio::pin!(wait);
  let output = match spec.timeout {
    Some(limit) => match tokio::time::timeout(limit, &mut wait).await {
      Ok(result) => result,
      Err(_) => {
        error!(cmd = %cmd_line, timeout = ?limit, "command timed out, killing process group");
        if let Some(group) = group {
          kill_group(group);
        }
        if tokio::time::timeout(REAP_GRACE, &mut wait).await.is_err() {
          warn!(cmd = %cmd_line, "killed command still holds its output open");
        }
        return Err(CommandError::TimedOut {
          cmd: cmd_line,
          timeout: limit,
        });
      }
    },
    None => wait.await,
  }
  .map_err(|source| CommandError::Wait {
    cmd: cmd_line.clone(),
    source,
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

  if !output.status.success() {
    error!(cmd = %cmd_line, code = ?output.status.code(), "command returned non-zero exit code");
    if !stderr.is_empty() {
      error!(stderr = %tail(&stderr, STDERR_TAIL_LINES), "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }

    return Err(CommandError::Failed {
      cmd: cmd_line,
      code: output.status.code(),
      stderr,
    });
  }

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(CommandOutput { stdout, stderr })
}

fn kill_group(group: Pid) {
  match kill_process_group(group, Signal::KILL) {
    Ok(()) => {}
    // The whole group already exited.
    Err(e) if e == rustix::io::Errno::SRCH => {}
    Err(e) => warn!(pgid = group.as_raw_nonzero().get(), error = %e, "could not kill process group"),
  }
}

fn tail(text: &str, lines: usize) -> String {
  let all: Vec<&str> = text.lines().collect();
  let start = all.len().saturating_sub(lines);
  all[start..].join("\n")
}

/// Shell used for configured command strings.
///
/// Always `/bin/sh` rather than `$SHELL`, so interactive profiles never
/// leak into the build environment.
pub(super) fn get_shell() -> (String, Vec<String>) {
  ("/bin/sh".to_string(), vec!["-c".to_string()])
}

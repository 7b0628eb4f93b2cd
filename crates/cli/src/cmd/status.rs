//! Status command implementation.
//!
//! Displays the recorded version, artifact and lock status of every branch.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use pkgrelay_lib::config::Config;
use pkgrelay_lib::pipeline::DefaultPipeline;
use pkgrelay_lib::state_lock::{LockError, LockMode, StateLock};

use crate::output::{OutputFormat, print_json, print_stat, print_warning, symbols};

pub fn cmd_status(config: &Config, output: OutputFormat) -> Result<()> {
  // A running pipeline only delays fresh values; report it and read anyway.
  let _lock = match StateLock::acquire(&config.state_dir, LockMode::Shared, "status") {
    Ok(lock) => Some(lock),
    Err(LockError::Busy { holder, .. }) => {
      match holder {
        Some(holder) => print_warning(&format!("State is being updated by {}", holder)),
        None => print_warning("State is being updated by another process"),
      }
      None
    }
    Err(e) => return Err(e).context("Failed to acquire state lock"),
  };

  let states = DefaultPipeline::from_config(config)?
    .status()
    .context("Failed to read pipeline state")?;

  if output.is_json() {
    return print_json(&states);
  }

  for (i, state) in states.iter().enumerate() {
    if i > 0 {
      println!();
    }
    if state.is_locked() {
      println!(
        "{} {} {}",
        symbols::LOCKED,
        state.branch,
        "(locked)".if_supports_color(Stream::Stdout, |s| s.red())
      );
    } else {
      println!(
        "{} {}",
        symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
        state.branch
      );
    }
    print_stat("Version", state.version.as_deref().unwrap_or("-"));
    print_stat("Artifact", state.artifact.as_deref().unwrap_or("-"));
  }
  Ok(())
}

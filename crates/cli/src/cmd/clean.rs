//! Implementation of the `pkgrelay clean` command.
//!
//! Removes the working directories and the version cache so every branch is
//! rebuilt on the next check. Lock statuses and artifact records survive.

use anyhow::{Context, Result};

use pkgrelay_lib::config::Config;
use pkgrelay_lib::pipeline::DefaultPipeline;
use pkgrelay_lib::state_lock::{LockMode, StateLock};

use crate::output::{print_info, print_stat, print_success};

pub fn cmd_clean(config: &Config) -> Result<()> {
  let _lock = StateLock::acquire(&config.state_dir, LockMode::Exclusive, "clean").context("Failed to acquire state lock")?;

  let report = DefaultPipeline::from_config(config)?.clean().context("Clean failed")?;

  if !report.workdir_removed && !report.versions_cleared {
    print_info("Nothing to clean");
    return Ok(());
  }

  print_success("Cleaned working state");
  print_stat("Working directories", yes_no(report.workdir_removed));
  print_stat("Version cache", yes_no(report.versions_cleared));
  Ok(())
}

fn yes_no(removed: bool) -> &'static str {
  if removed { "removed" } else { "not present" }
}

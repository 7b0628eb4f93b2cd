//! Implementation of the `pkgrelay check` command.

use anyhow::{Context, Result, bail};

use pkgrelay_lib::branch::Branch;
use pkgrelay_lib::config::Config;
use pkgrelay_lib::pipeline::{CycleOutcome, DefaultPipeline};
use pkgrelay_lib::state_lock::{LockMode, StateLock};

use crate::output::print_outcome;

/// Run one cycle for `branch`. A failed build or publish is a failed command.
pub fn cmd_check(config: &Config, branch: Branch) -> Result<()> {
  let _lock = StateLock::acquire(&config.state_dir, LockMode::Exclusive, &format!("check {}", branch))
    .context("Failed to acquire state lock")?;

  let pipeline = DefaultPipeline::from_config(config)?;
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let outcome = rt
    .block_on(pipeline.check_for_updates(branch))
    .with_context(|| format!("Update check for {} failed", branch))?;

  print_outcome(branch, &outcome);
  if let CycleOutcome::LockedOut { version } = outcome {
    bail!("Build of {} {} failed", branch, version);
  }
  Ok(())
}

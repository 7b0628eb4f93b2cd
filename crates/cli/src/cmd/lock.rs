use anyhow::{Context, Result};

use pkgrelay_lib::branch::Branch;
use pkgrelay_lib::config::Config;
use pkgrelay_lib::pipeline::DefaultPipeline;
use pkgrelay_lib::state_lock::{LockMode, StateLock};

use crate::output::print_success;

pub fn cmd_lock(config: &Config, branch: Branch) -> Result<()> {
  let _lock = StateLock::acquire(&config.state_dir, LockMode::Exclusive, &format!("lock {}", branch))
    .context("Failed to acquire state lock")?;

  DefaultPipeline::from_config(config)?
    .lock(branch)
    .with_context(|| format!("Failed to lock {}", branch))?;

  print_success(&format!("Locked {}; automatic builds are disabled", branch));
  Ok(())
}

pub fn cmd_unlock(config: &Config, branch: Branch) -> Result<()> {
  let _lock = StateLock::acquire(&config.state_dir, LockMode::Exclusive, &format!("unlock {}", branch))
    .context("Failed to acquire state lock")?;

  DefaultPipeline::from_config(config)?
    .unlock(branch)
    .with_context(|| format!("Failed to unlock {}", branch))?;

  print_success(&format!("Unlocked {}; builds resume on the next check", branch));
  Ok(())
}

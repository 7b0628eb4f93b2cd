//! Implementation of the `pkgrelay run` command.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::warn;

use pkgrelay_lib::config::Config;
use pkgrelay_lib::pipeline::DefaultPipeline;
use pkgrelay_lib::state_lock::{LockMode, StateLock};

use crate::output::{format_duration, print_error, print_info, print_outcome, print_stat};

/// Execute the run command.
///
/// Without `--daemon`, checks every branch once and fails if any branch
/// errored. With `--daemon`, keeps checking every `interval` until Ctrl-C;
/// errors are logged and the next cycle proceeds. Build commands run in their
/// own process group, so Ctrl-C lets a cycle in progress finish instead of
/// failing its build.
pub fn cmd_run(config: &Config, daemon: bool, interval: Option<Duration>) -> Result<()> {
  let pipeline = DefaultPipeline::from_config(config)?;
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  if daemon {
    let interval = interval.unwrap_or_else(|| config.interval());
    print_info(&format!(
      "Checking for updates every {}",
      humantime::format_duration(interval)
    ));
    let cycles = rt.block_on(pipeline.run_daemon(interval, shutdown_signal()));
    print_info(&format!("Stopped after {} cycles", cycles));
    return Ok(());
  }

  let _lock = StateLock::acquire(&config.state_dir, LockMode::Exclusive, "run").context("Failed to acquire state lock")?;

  let start = Instant::now();
  let report = rt.block_on(pipeline.run_cycle());

  for (branch, result) in &report.results {
    match result {
      Ok(outcome) => print_outcome(*branch, outcome),
      Err(e) => print_error(&format!("{}: {}", branch, e)),
    }
  }
  println!();
  print_stat("Published", &report.published().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));

  let failed: Vec<String> = report.failures().map(|(branch, _)| branch.to_string()).collect();
  if !failed.is_empty() {
    bail!("Update check failed for: {}", failed.join(", "));
  }
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(error = %e, "could not listen for Ctrl-C, running until killed");
    std::future::pending::<()>().await;
  }
}

mod cmd;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pkgrelay_lib::branch::Branch;
use pkgrelay_lib::config::Config;

use crate::cmd::{cmd_check, cmd_clean, cmd_lock, cmd_run, cmd_status, cmd_unlock};
use crate::output::OutputFormat;

/// pkgrelay - builds and publishes Discord packages into a pacman repository
#[derive(Parser)]
#[command(name = "pkgrelay")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the config file (default: $PKGRELAY_CONFIG, then ./config.json)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Check every branch and build what changed
  Run {
    /// Keep running, checking again after each interval
    #[arg(long)]
    daemon: bool,

    /// Time between checks in daemon mode, in seconds or as "5m" (default: config `interval`)
    #[arg(long, value_parser = parse_interval, requires = "daemon")]
    interval: Option<Duration>,
  },

  /// Check a single branch
  Check { branch: Branch },

  /// Stop automatic builds for a branch
  Lock { branch: Branch },

  /// Allow automatic builds for a locked branch again
  Unlock { branch: Branch },

  /// Remove working directories and the version cache
  Clean,

  /// Show recorded versions, artifacts and lock status
  Status {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn parse_interval(value: &str) -> Result<Duration, String> {
  let interval = match value.parse::<u64>() {
    Ok(secs) => Duration::from_secs(secs),
    Err(_) => humantime::parse_duration(value).map_err(|e| e.to_string())?,
  };
  if interval.is_zero() {
    return Err("interval must be greater than zero".to_string());
  }
  Ok(interval)
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .init();

  let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

  match cli.command {
    Commands::Run { daemon, interval } => cmd_run(&config, daemon, interval),
    Commands::Check { branch } => cmd_check(&config, branch),
    Commands::Lock { branch } => cmd_lock(&config, branch),
    Commands::Unlock { branch } => cmd_unlock(&config, branch),
    Commands::Clean => cmd_clean(&config),
    Commands::Status { output } => cmd_status(&config, output),
  }
}

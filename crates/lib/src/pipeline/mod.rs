//! The release pipeline.
//!
//! One cycle for a branch moves through:
//!
//! ```text
//! Idle -> CheckingVersion -> NoUpdate
//!                         -> Building -> BuildFailed -> LockedOut
//!                                     -> Publishing -> Published
//!                                                   -> PublishFailed (rolled back)
//! ```
//!
//! A build failure locks the branch until an operator unlocks it. A publish
//! failure puts the previous artifact back and leaves the branch active, so
//! the next cycle tries again.

mod types;

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub use types::*;

use crate::branch::Branch;
use crate::build::{BuildOrchestrator, MakepkgToolchain, Toolchain};
use crate::config::Config;
use crate::notify::{Notifier, WebhookNotifier};
use crate::repo::{GpgRepoTools, RepoPublisher, RepoTools};
use crate::source::{HttpVersionSource, VersionSource};
use crate::state::{BranchState, StateStore};
use crate::state_lock::{LockMode, StateLock};

/// Coordinates version checks, builds and publishing for every branch.
#[derive(Debug)]
pub struct ReleasePipeline<S, N, T, R> {
  source: S,
  notifier: N,
  builder: BuildOrchestrator<T>,
  publisher: RepoPublisher<R>,
  state: StateStore,
  state_dir: PathBuf,
  work_root: PathBuf,
}

/// The pipeline wired to the real upstream, webhooks and Arch tooling.
pub type DefaultPipeline = ReleasePipeline<HttpVersionSource, WebhookNotifier, MakepkgToolchain, GpgRepoTools>;

impl DefaultPipeline {
  pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
    Ok(Self::new(
      config,
      HttpVersionSource::new(config.version_endpoint.clone())?,
      WebhookNotifier::new(config.webhooks.clone())?,
      MakepkgToolchain::from_config(config),
      GpgRepoTools,
    ))
  }
}

impl<S, N, T, R> ReleasePipeline<S, N, T, R>
where
  S: VersionSource,
  N: Notifier,
  T: Toolchain,
  R: RepoTools,
{
  pub fn new(config: &Config, source: S, notifier: N, toolchain: T, tools: R) -> Self {
    Self {
      source,
      notifier,
      builder: BuildOrchestrator::new(config, toolchain),
      publisher: RepoPublisher::new(config, tools),
      state: StateStore::new(&config.state_dir),
      state_dir: config.state_dir.clone(),
      work_root: config.workdir.clone(),
    }
  }

  pub fn state(&self) -> &StateStore {
    &self.state
  }

  /// Run one cycle for `branch`.
  ///
  /// Build failures are absorbed into [`CycleOutcome::LockedOut`]; an `Err`
  /// means state, notification or publishing failed.
  pub async fn check_for_updates(&self, branch: Branch) -> Result<CycleOutcome, PipelineError> {
    info!(%branch, "checking for updates");

    if self.state.is_locked(branch)? {
      debug!(%branch, "branch is locked, skipping");
      return Ok(CycleOutcome::no_update(NoUpdateReason::Locked));
    }

    let version = match self.source.current_version(branch).await {
      Ok(version) => version,
      Err(e) => {
        warn!(%branch, error = %e, "could not get current version");
        return Ok(CycleOutcome::no_update(NoUpdateReason::SourceUnavailable));
      }
    };

    let cached = self.state.versions.get(branch)?;
    if cached.as_deref() == Some(version.as_str()) {
      info!(%branch, %version, "no new version available");
      return Ok(CycleOutcome::no_update(NoUpdateReason::UpToDate));
    }

    info!(%branch, %version, previous = ?cached, "new version available");
    self.notifier.send(&update_detected_message(branch, &version)).await?;

    let built = match self.builder.build(branch, &version).await {
      Ok(path) => path,
      Err(e) => {
        error!(%branch, %version, error = %e, "build failed, locking branch");
        self.state.lock(branch)?;
        self.notifier.send(&build_failed_message(branch, &version)).await?;
        return Ok(CycleOutcome::LockedOut { version });
      }
    };

    let (artifact, archived) = self.publish(branch, &version, &built).await?;

    match self.publisher.prune_stale().await {
      Ok(removed) if !removed.is_empty() => debug!(?removed, "removed stale repository files"),
      Ok(_) => {}
      Err(e) => warn!(error = %e, "could not prune stale repository files"),
    }

    self.state.record_release(branch, &version, &artifact)?;
    self.notifier.send(&published_message(branch, &version)).await?;

    info!(%branch, %version, %artifact, "release published");
    Ok(CycleOutcome::Published {
      version,
      artifact,
      archived,
    })
  }

  /// Archive the previous artifact and publish `built`, rolling back on failure.
  async fn publish(
    &self,
    branch: Branch,
    version: &str,
    built: &Path,
  ) -> Result<(String, Option<String>), PipelineError> {
    let failed = |source, restored| PipelineError::Publish {
      branch,
      version: version.to_string(),
      source,
      restored,
    };

    let archived = match self.state.artifacts.get(branch)? {
      Some(previous) => match self.publisher.archive(&previous).await {
        Ok(true) => Some(previous),
        Ok(false) => {
          warn!(%branch, %previous, "previous package not found in repository");
          None
        }
        Err(e) => {
          error!(%branch, %previous, error = %e, "could not archive previous package");
          self.report_publish_failure(branch, version).await;
          return Err(failed(e, false));
        }
      },
      None => None,
    };

    match self.publisher.publish(built).await {
      Ok(artifact) => Ok((artifact, archived)),
      Err(e) => {
        error!(%branch, version, error = %e, "publish failed, rolling back");
        let restored = self.roll_back(built, archived.as_deref()).await;
        self.report_publish_failure(branch, version).await;
        Err(failed(e, restored))
      }
    }
  }

  /// The publish error is what the caller sees, so a failed notification is only logged.
  async fn report_publish_failure(&self, branch: Branch, version: &str) {
    if let Err(e) = self.notifier.send(&publish_failed_message(branch, version)).await {
      warn!(error = %e, "could not send publish failure notification");
    }
  }

  /// Remove the partially published file and put the archived one back.
  ///
  /// Returns whether an archived artifact was restored.
  async fn roll_back(&self, built: &Path, archived: Option<&str>) -> bool {
    if let Some(name) = built.file_name().and_then(|n| n.to_str())
      && let Err(e) = self.publisher.discard(name).await
    {
      warn!(filename = name, error = %e, "could not remove partially published package");
    }

    let Some(previous) = archived else {
      return false;
    };
    match self.publisher.restore(previous).await {
      Ok(restored) => restored,
      Err(e) => {
        error!(previous, error = %e, "could not restore archived package");
        false
      }
    }
  }

  /// Run one cycle for every branch, in order. Errors are collected, not propagated.
  pub async fn run_cycle(&self) -> CycleReport {
    let mut report = CycleReport::default();
    for branch in Branch::ALL {
      let result = self.check_for_updates(branch).await;
      if let Err(e) = &result {
        error!(%branch, error = %e, "update check failed");
      }
      report.results.push((branch, result));
    }
    report
  }

  /// Run cycles every `interval` until `shutdown` resolves. Returns the number of cycles run.
  ///
  /// The state lock is held for each cycle only, so manual `lock`/`unlock`
  /// can run between cycles. A cycle that finds the lock taken is skipped.
  /// `shutdown` is watched from the start, but a cycle in flight always runs
  /// to completion: stopping the daemon never cuts a build short, so it can
  /// never be mistaken for a build failure.
  pub async fn run_daemon(&self, interval: Duration, shutdown: impl Future<Output = ()>) -> usize {
    info!(interval = ?interval, "running in daemon mode");
    tokio::pin!(shutdown);

    let mut cycles = 0;
    let mut stopping = false;
    loop {
      cycles += 1;
      let cycle = self.locked_cycle(cycles);
      tokio::pin!(cycle);
      tokio::select! {
        _ = &mut cycle => {}
        _ = &mut shutdown => {
          info!("shutdown requested, finishing the current cycle");
          stopping = true;
          cycle.await;
        }
      }
      if stopping {
        break;
      }

      info!("next check in {}s", interval.as_secs());
      tokio::select! {
        _ = &mut shutdown => {
          info!("shutdown requested, stopping");
          break;
        }
        _ = tokio::time::sleep(interval) => {}
      }
    }
    cycles
  }

  async fn locked_cycle(&self, cycle: usize) {
    match StateLock::acquire(&self.state_dir, LockMode::Exclusive, "run --daemon") {
      Ok(_lock) => {
        let report = self.run_cycle().await;
        debug!(
          cycle,
          published = report.published(),
          failed = report.failures().count(),
          "cycle finished"
        );
      }
      Err(e) => warn!(cycle, error = %e, "state is busy, skipping this cycle"),
    }
  }

  pub fn lock(&self, branch: Branch) -> Result<(), PipelineError> {
    self.state.lock(branch)?;
    Ok(())
  }

  pub fn unlock(&self, branch: Branch) -> Result<(), PipelineError> {
    self.state.unlock(branch)?;
    Ok(())
  }

  /// Remove every working directory and the version cache.
  ///
  /// Lock statuses and artifact records are kept, so a clean never unlocks a branch.
  pub fn clean(&self) -> Result<CleanReport, PipelineError> {
    info!(workdir = %self.work_root.display(), "cleaning working state");

    let workdir_removed = match std::fs::remove_dir_all(&self.work_root) {
      Ok(()) => true,
      Err(e) if e.kind() == io::ErrorKind::NotFound => false,
      Err(source) => {
        return Err(PipelineError::Clean {
          path: self.work_root.clone(),
          source,
        });
      }
    };
    let versions_cleared = self.state.versions.clear()?;

    Ok(CleanReport {
      workdir_removed,
      versions_cleared,
    })
  }

  pub fn status(&self) -> Result<Vec<BranchState>, PipelineError> {
    Ok(self.state.summary()?)
  }
}

//! Sync orchestrator
//!
//! Drives cycles of fetch both snapshots -> diff -> execute -> sleep.
//!
//! Actions run strictly in sequence: deletes, then loads, then reloads. A
//! reload is a delete followed by an upload, not an atomic replace. If the
//! upload fails after the delete succeeded, the file stays absent remotely
//! until the next cycle plans it as a load.
//!
//! Nothing is carried between cycles: every cycle re-scans both sides and
//! re-diffs, which is also how failed actions get retried.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

use super::report::{ActionKind, CycleReport};
use crate::diff::diff;
use crate::local::{self, ScanError};
use crate::models::SyncPlan;
use crate::remote::{DeleteOutcome, RemoteError, RemoteStorage};

/// Errors surfaced by the engine
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote rejected the credentials; no later cycle can succeed
    #[error("Remote storage rejected the credentials")]
    Unauthorized,

    /// Any other remote failure
    #[error("Remote storage error: {0}")]
    Remote(#[source] RemoteError),

    /// Local directory missing or unreadable
    #[error("Local directory error: {0}")]
    Local(#[from] ScanError),
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        if err.is_fatal() {
            SyncError::Unauthorized
        } else {
            SyncError::Remote(err)
        }
    }
}

impl SyncError {
    /// Whether the agent must stop instead of waiting for the next cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Unauthorized)
    }

    /// What the operator can do about this error, if anything
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            SyncError::Unauthorized => RemoteError::Unauthorized.recovery_suggestion(),
            SyncError::Remote(e) => e.recovery_suggestion(),
            SyncError::Local(ScanError::NotADirectory { .. }) => {
                Some("Create the folder or fix `local_path` in the configuration.")
            }
            SyncError::Local(_) => None,
        }
    }
}

/// Result type for engine operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Between cycles
    Idle,
    /// A cycle is in progress
    Syncing,
}

/// One-way mirror of a local directory onto a [`RemoteStorage`]
pub struct SyncEngine<R> {
    remote: R,
    local_dir: PathBuf,
    period: Duration,
    state: EngineState,
    cycles: u64,
}

impl<R: RemoteStorage> SyncEngine<R> {
    /// Create an engine; fails if `local_dir` is not a directory
    pub fn new(remote: R, local_dir: impl Into<PathBuf>, period: Duration) -> SyncResult<Self> {
        let local_dir = local_dir.into();
        if !local_dir.is_dir() {
            return Err(ScanError::NotADirectory { path: local_dir }.into());
        }

        Ok(Self {
            remote,
            local_dir,
            period,
            state: EngineState::Idle,
            cycles: 0,
        })
    }

    /// Current state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Number of cycles run so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Mirrored directory
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Remote side
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Fetch both snapshots and compute the plan without executing it
    pub fn plan(&self) -> SyncResult<SyncPlan> {
        let remote = self.remote.list()?;
        info!(files = remote.len(), "Fetched remote file list");

        let local = local::scan(&self.local_dir)?;
        info!(files = local.len(), "Fetched local file list");

        let plan = diff(&remote, &local);
        info!(
            load = plan.load.len(),
            reload = plan.reload.len(),
            delete = plan.delete.len(),
            "Computed sync plan"
        );
        Ok(plan)
    }

    /// Run cycles until `max_cycles` is reached, or forever when `None`
    ///
    /// Returns only on a fatal error or after the last bounded cycle.
    pub fn run(&mut self, max_cycles: Option<u64>) -> SyncResult<()> {
        if max_cycles == Some(0) {
            return Ok(());
        }

        info!(
            local_dir = %self.local_dir.display(),
            period_secs = self.period.as_secs_f64(),
            "First synchronization"
        );

        let mut completed = 0u64;
        loop {
            self.run_cycle()?;
            completed += 1;

            if max_cycles.is_some_and(|max| completed >= max) {
                return Ok(());
            }

            debug!(period_secs = self.period.as_secs_f64(), "Waiting for next cycle");
            thread::sleep(self.period);
        }
    }

    /// Run a single cycle
    ///
    /// Non-fatal failures are recorded in the report; only
    /// [`SyncError::Unauthorized`] is returned as an error.
    pub fn run_cycle(&mut self) -> SyncResult<CycleReport> {
        let span = info_span!("cycle", n = self.cycles + 1);
        let _enter = span.enter();

        self.state = EngineState::Syncing;
        info!("Synchronization started");

        let result = self.sync_once();

        self.state = EngineState::Idle;
        self.cycles += 1;

        match &result {
            Ok(report) => report.log(),
            Err(e) => error!(error = %e, "Synchronization aborted"),
        }
        result
    }

    fn sync_once(&self) -> SyncResult<CycleReport> {
        let plan = match self.plan() {
            Ok(plan) => plan,
            Err(e) if e.is_fatal() => return Err(e),
            Err(SyncError::Remote(RemoteError::NotFound { path })) => {
                warn!(path = %path, "Remote folder does not exist");
                return Ok(CycleReport::skipped(format!(
                    "remote folder '{}' not found",
                    path
                )));
            }
            Err(e) => {
                error!(error = %e, "Could not determine file lists");
                return Ok(CycleReport::skipped(e.to_string()));
            }
        };

        let mut report = CycleReport::new(plan.clone());

        for name in &plan.delete {
            match self.remote.delete(name) {
                Ok(DeleteOutcome::Deleted) => report.deleted.push(name.clone()),
                Ok(DeleteOutcome::AlreadyAbsent) => report.already_absent.push(name.clone()),
                Err(e) => record_failure(&mut report, ActionKind::Delete, name, e)?,
            }
        }

        for name in &plan.load {
            match self.remote.upload(&self.local_dir.join(name), name) {
                Ok(()) => report.uploaded.push(name.clone()),
                Err(e) => record_failure(&mut report, ActionKind::Load, name, e)?,
            }
        }

        for name in &plan.reload {
            self.reload(name, &mut report)?;
        }

        Ok(report)
    }

    fn reload(&self, name: &str, report: &mut CycleReport) -> SyncResult<()> {
        match self.remote.delete(name) {
            Ok(DeleteOutcome::Deleted) => {}
            Ok(DeleteOutcome::AlreadyAbsent) => {
                debug!(name, "Remote copy vanished before reload");
            }
            Err(e) => return record_failure(report, ActionKind::Reload, name, e),
        }

        match self.remote.upload(&self.local_dir.join(name), name) {
            Ok(()) => {
                report.reloaded.push(name.to_string());
                Ok(())
            }
            Err(e) => {
                if !e.is_fatal() {
                    warn!(
                        name,
                        "Remote copy was removed but the upload failed; it stays absent until the next cycle"
                    );
                }
                record_failure(report, ActionKind::Reload, name, e)
            }
        }
    }
}

/// Record a failed action, or abort the cycle if the failure is fatal
fn record_failure(
    report: &mut CycleReport,
    action: ActionKind,
    name: &str,
    err: RemoteError,
) -> SyncResult<()> {
    if err.is_fatal() {
        return Err(SyncError::Unauthorized);
    }

    error!(name, action = ?action, error = %err, "Action failed");
    report.fail(action, name, &err);
    Ok(())
}

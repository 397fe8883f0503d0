//! Per-cycle outcome

use serde::Serialize;
use tracing::{error, info, warn};

use crate::models::SyncPlan;

/// Kind of planned action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Delete,
    Load,
    Reload,
}

/// An action abandoned for this cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAction {
    pub name: String,
    pub action: ActionKind,
    pub error: String,
}

/// What one cycle planned and what it achieved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Plan computed for the cycle (empty when skipped)
    pub plan: SyncPlan,
    /// Removed from the remote
    pub deleted: Vec<String>,
    /// Delete requested but the remote copy was already gone
    pub already_absent: Vec<String>,
    /// Uploaded for the first time
    pub uploaded: Vec<String>,
    /// Replaced on the remote
    pub reloaded: Vec<String>,
    /// Actions that failed; retried by the next cycle's re-diff
    pub failed: Vec<FailedAction>,
    /// Why the cycle performed no actions at all
    pub skipped: Option<String>,
}

impl CycleReport {
    pub fn new(plan: SyncPlan) -> Self {
        Self {
            plan,
            ..Self::default()
        }
    }

    /// A cycle that could not determine one of the snapshots
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Self::default()
        }
    }

    /// True when the cycle ran and every action succeeded
    pub fn is_clean(&self) -> bool {
        self.skipped.is_none() && self.failed.is_empty()
    }

    pub(crate) fn fail(&mut self, action: ActionKind, name: &str, error: impl ToString) {
        self.failed.push(FailedAction {
            name: name.to_string(),
            action,
            error: error.to_string(),
        });
    }

    /// Emit the summary record for this cycle
    pub fn log(&self) {
        if let Some(ref reason) = self.skipped {
            warn!(reason = %reason, "Synchronization skipped");
            return;
        }

        if self.failed.is_empty() {
            info!(
                deleted = self.deleted.len() + self.already_absent.len(),
                uploaded = self.uploaded.len(),
                reloaded = self.reloaded.len(),
                "Synchronization finished"
            );
        } else {
            error!(
                deleted = self.deleted.len() + self.already_absent.len(),
                uploaded = self.uploaded.len(),
                reloaded = self.reloaded.len(),
                failed = self.failed.len(),
                "Synchronization finished with failures"
            );
        }
    }
}

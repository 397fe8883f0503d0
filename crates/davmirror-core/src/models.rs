//! Data models for davmirror
//!
//! Defines the metadata shape shared by the local scanner and the remote
//! codec, and the action plan produced by the diff engine.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a single file on either side of the mirror
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    /// File name, unique within a snapshot
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, whole seconds
    pub last_modified: DateTime<Utc>,
}

impl FileMetadata {
    /// Create metadata, dropping sub-second precision from the timestamp
    ///
    /// The remote side reports modification times with second granularity,
    /// so both sides are compared at that resolution.
    pub fn new(name: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size,
            last_modified: last_modified.trunc_subsecs(0),
        }
    }
}

/// Point-in-time view of one side, keyed by file name
pub type Snapshot = HashMap<String, FileMetadata>;

/// Actions needed to bring the remote side in line with the local one
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncPlan {
    /// Present locally, missing remotely
    pub load: BTreeSet<String>,
    /// Present on both sides, changed locally
    pub reload: BTreeSet<String>,
    /// Present remotely, missing locally
    pub delete: BTreeSet<String>,
}

impl SyncPlan {
    /// True when there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.load.is_empty() && self.reload.is_empty() && self.delete.is_empty()
    }

    /// Total number of planned actions
    pub fn len(&self) -> usize {
        self.load.len() + self.reload.len() + self.delete.len()
    }
}

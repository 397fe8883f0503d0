//! Synchronization cycles
//!
//! One cycle:
//! 1. List the remote collection and scan the local directory
//! 2. Diff the two snapshots into a plan
//! 3. Delete, then load, then reload
//!
//! ## Usage
//!
//! ```ignore
//! let client = WebDavClient::new(config.remote_config())?;
//! let mut engine = SyncEngine::new(client, &config.local_path, config.sync_period)?;
//! engine.run(None)?;
//! ```

mod engine;
mod report;

pub use engine::{EngineState, SyncEngine, SyncError, SyncResult};
pub use report::{ActionKind, CycleReport, FailedAction};

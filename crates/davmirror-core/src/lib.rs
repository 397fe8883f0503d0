//! davmirror Core Library
//!
//! One-way mirroring of a local directory onto WebDAV storage
//! (Yandex.Disk by default). Files only present locally are uploaded,
//! files changed locally are replaced, files only present remotely are
//! deleted. Nested folders are never synchronized.
//!
//! # Architecture
//!
//! Every cycle re-scans both sides from scratch; nothing is persisted
//! between cycles.
//!
//! ```text
//! WebDavClient::list ──┐
//!                      ├─> diff ─> SyncPlan ─> delete / upload
//! local::scan ─────────┘
//! ```
//!
//! # Modules
//!
//! - `models`: File metadata, snapshots and the sync plan
//! - `local`: Local directory scanner
//! - `remote`: WebDAV client, multistatus codec, remote errors
//! - `diff`: Snapshot comparison
//! - `sync`: Cycle orchestration
//! - `hash`: Content digests sent with uploads
//! - `config`: Application configuration

pub mod config;
pub mod diff;
pub mod hash;
pub mod local;
pub mod models;
pub mod remote;
pub mod sync;

pub use config::{Config, ConfigError};
pub use diff::diff;
pub use local::{scan, ScanError};
pub use models::{FileMetadata, Snapshot, SyncPlan};
pub use remote::{
    DeleteOutcome, RemoteClientConfig, RemoteError, RemoteStorage, WebDavClient,
};
pub use sync::{CycleReport, EngineState, SyncEngine, SyncError};

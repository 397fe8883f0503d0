//! Local directory scanner
//!
//! Produces a [`Snapshot`] of one local directory. Not recursive: nested
//! directories are reported and skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{FileMetadata, Snapshot};

/// Errors that can occur while scanning the local directory
#[derive(Error, Debug)]
pub enum ScanError {
    /// Path exists but is not a directory, or does not exist at all
    #[error("'{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    /// Directory could not be listed
    #[error("Failed to read directory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Scan `path` and return metadata for every regular file directly inside it
pub fn scan(path: &Path) -> ScanResult<Snapshot> {
    if !path.is_dir() {
        return Err(ScanError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    let entries = fs::read_dir(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut snapshot = Snapshot::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let Ok(name) = entry.file_name().into_string() else {
            warn!(path = ?entry.path(), "Skipping entry with non UTF-8 name");
            continue;
        };

        // Follows symlinks, so a link to a folder counts as a folder
        let metadata = match fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(e) => {
                warn!(name = %name, error = %e, "Skipping unreadable local entry");
                continue;
            }
        };

        if metadata.is_dir() {
            warn!(
                name = %name,
                "Local entry is a folder; nested folders are not synchronized"
            );
            continue;
        }

        let modified = match metadata.modified() {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(e) => {
                warn!(name = %name, error = %e, "Skipping entry without modification time");
                continue;
            }
        };

        snapshot.insert(name.clone(), FileMetadata::new(name, metadata.len(), modified));
    }

    debug!(count = snapshot.len(), path = %path.display(), "Scanned local directory");
    Ok(snapshot)
}

//! Remote storage error handling
//!
//! Classifies transport and HTTP failures so the orchestrator can tell a
//! fatal credential problem from a failure the next cycle will retry.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the remote storage
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Credentials rejected (HTTP 401)
    #[error("Unauthorized: the remote storage rejected the token. Check the token in the configuration.")]
    Unauthorized,

    /// Collection not found (HTTP 404 while listing)
    #[error("Remote path not found: '{path}'")]
    NotFound { path: String },

    /// Listing returned an unexpected status
    #[error("Remote request failed (status {status}): {body}")]
    RequestFailed { status: u16, body: String },

    /// Upload returned anything but 201 Created
    #[error("Upload of '{name}' failed (status {status})")]
    UploadFailed { name: String, status: u16 },

    /// Delete returned anything but 204 or 404
    #[error("Delete of '{name}' failed (status {status})")]
    DeleteFailed { name: String, status: u16 },

    /// Listing body is not a multistatus document
    #[error("Malformed remote response: {0}")]
    MalformedResponse(String),

    /// Local file to upload could not be read
    #[error("Failed to read local file '{path}': {source}")]
    LocalFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Request could not be built (bad base URL or path)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection, TLS, timeout and other transport failures
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl RemoteError {
    /// Invalid credentials cannot heal on their own; the process must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, RemoteError::Unauthorized)
    }

    /// Whether the next cycle may succeed without operator action
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RemoteError::RequestFailed { .. }
                | RemoteError::UploadFailed { .. }
                | RemoteError::DeleteFailed { .. }
                | RemoteError::MalformedResponse(_)
                | RemoteError::LocalFile { .. }
                | RemoteError::Transport(_)
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            RemoteError::Unauthorized => {
                Some("Issue a new OAuth token and update `token` in the configuration.")
            }
            RemoteError::NotFound { .. } => {
                Some("Create the folder on the remote storage or fix `cloud_path`.")
            }
            RemoteError::InvalidRequest(_) => Some("Check `base_url` and `cloud_path`."),
            _ => None,
        }
    }
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

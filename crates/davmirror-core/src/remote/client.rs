//! WebDAV client
//!
//! Blocking client for the three operations the mirror needs: list a
//! collection, upload a file, delete a file.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, EXPECT};
use reqwest::{Method, StatusCode, Url};
use tracing::{debug, error, info, warn};

use super::codec;
use super::error::{RemoteError, RemoteResult};
use crate::hash::calculate_hashes;
use crate::models::Snapshot;

/// Yandex.Disk WebDAV endpoint
pub const DEFAULT_BASE_URL: &str = "https://webdav.yandex.ru";

/// Request timeout in seconds; generous because uploads stream whole files
const REQUEST_TIMEOUT: u64 = 600;

/// Connection settings, fixed for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteClientConfig {
    /// Server root, e.g. `https://webdav.yandex.ru`
    pub base_url: String,
    /// Collection to mirror into, relative to the server root (may be empty)
    pub cloud_path: String,
    /// OAuth token, with or without its scheme
    pub auth_token: String,
}

/// Outcome of a successful delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The server removed the file (204)
    Deleted,
    /// The file was already gone (404)
    AlreadyAbsent,
}

/// Operations the sync engine needs from the remote side
pub trait RemoteStorage {
    /// Metadata for every file directly inside the configured collection
    fn list(&self) -> RemoteResult<Snapshot>;

    /// Upload `local_path` as `name`, replacing any existing file
    fn upload(&self, local_path: &Path, name: &str) -> RemoteResult<()>;

    /// Delete `name` from the collection
    fn delete(&self, name: &str) -> RemoteResult<DeleteOutcome>;
}

/// WebDAV implementation of [`RemoteStorage`]
pub struct WebDavClient {
    config: RemoteClientConfig,
    http: Client,
}

impl WebDavClient {
    /// Create a client with default HTTP settings
    pub fn new(config: RemoteClientConfig) -> RemoteResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT))
            .user_agent(concat!("davmirror/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_http_client(config, http))
    }

    /// Create a client around a preconfigured HTTP client
    pub fn with_http_client(config: RemoteClientConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// URL of the collection, or of `name` inside it
    ///
    /// Segments are percent-encoded, so names may contain spaces, `#` or `?`.
    pub fn url_for(&self, name: Option<&str>) -> RemoteResult<Url> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            RemoteError::InvalidRequest(format!("base URL '{}': {}", self.config.base_url, e))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                RemoteError::InvalidRequest(format!(
                    "base URL '{}' cannot carry a path",
                    self.config.base_url
                ))
            })?;
            segments.pop_if_empty();
            segments.extend(self.config.cloud_path.split('/').filter(|s| !s.is_empty()));
            match name {
                Some(name) => {
                    segments.push(name);
                }
                None => {
                    segments.push("");
                }
            }
        }

        Ok(url)
    }

    /// Value of the `Authorization` header
    ///
    /// A bare token gets the `OAuth` scheme; a token that already names
    /// a scheme is sent as is.
    fn authorization(&self) -> String {
        let token = self.config.auth_token.trim();
        if token.contains(char::is_whitespace) {
            token.to_string()
        } else {
            format!("OAuth {}", token)
        }
    }

    /// Send a request with credentials attached
    ///
    /// A 401 is turned into [`RemoteError::Unauthorized`] here for every
    /// operation; other statuses are left to the caller.
    fn execute(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request
            .header(AUTHORIZATION, self.authorization())
            .send()
            .map_err(|e| {
                warn!(error = %e, "Request to remote storage failed");
                RemoteError::Transport(e)
            })?;

        debug!(status = response.status().as_u16(), url = %response.url(), "Remote responded");

        if response.status() == StatusCode::UNAUTHORIZED {
            error!("Remote storage rejected the token");
            return Err(RemoteError::Unauthorized);
        }

        Ok(response)
    }
}

fn propfind() -> RemoteResult<Method> {
    Method::from_bytes(b"PROPFIND").map_err(|e| RemoteError::InvalidRequest(e.to_string()))
}

impl RemoteStorage for WebDavClient {
    fn list(&self) -> RemoteResult<Snapshot> {
        let url = self.url_for(None)?;
        info!(url = %url, "Requesting remote listing");

        let request = self
            .http
            .request(propfind()?, url)
            .header(ACCEPT, "*/*")
            .header("Depth", "1")
            .header(CONTENT_TYPE, "application/xml");

        let response = self.execute(request)?;
        let status = response.status();
        let body = response.text()?;

        if status.is_success() {
            info!("Received remote listing");
            return codec::parse(&body);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound {
                path: self.config.cloud_path.clone(),
            });
        }

        error!(status = status.as_u16(), body = %body, "Remote listing failed");
        Err(RemoteError::RequestFailed {
            status: status.as_u16(),
            body,
        })
    }

    fn upload(&self, local_path: &Path, name: &str) -> RemoteResult<()> {
        let url = self.url_for(Some(name))?;

        let local_error = |source| RemoteError::LocalFile {
            path: local_path.to_path_buf(),
            source,
        };
        let hashes = calculate_hashes(local_path).map_err(local_error)?;
        let file = File::open(local_path).map_err(local_error)?;

        info!(name, url = %url, "Uploading file");
        let request = self
            .http
            .put(url)
            .header("Etag", hashes.md5)
            .header("Sha256", hashes.sha256)
            .header(EXPECT, "100-continue")
            .body(Body::from(file));

        let response = self.execute(request)?;
        let status = response.status();

        if status == StatusCode::CREATED {
            info!(name, "Upload complete");
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        error!(name, status = status.as_u16(), body = %body, "Upload failed");
        Err(RemoteError::UploadFailed {
            name: name.to_string(),
            status: status.as_u16(),
        })
    }

    fn delete(&self, name: &str) -> RemoteResult<DeleteOutcome> {
        let url = self.url_for(Some(name))?;
        info!(name, url = %url, "Deleting remote file");

        let response = self.execute(self.http.delete(url))?;
        match response.status() {
            StatusCode::NO_CONTENT => {
                info!(name, "Remote file deleted");
                Ok(DeleteOutcome::Deleted)
            }
            StatusCode::NOT_FOUND => {
                warn!(name, "Remote file already absent");
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            status => {
                let body = response.text().unwrap_or_default();
                error!(name, status = status.as_u16(), body = %body, "Delete failed");
                Err(RemoteError::DeleteFailed {
                    name: name.to_string(),
                    status: status.as_u16(),
                })
            }
        }
    }
}

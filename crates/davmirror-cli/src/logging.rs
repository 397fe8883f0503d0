//! Log setup
//!
//! The agent logs to the file named by `log_path`. Nothing is installed as
//! the global subscriber: callers get a [`Dispatch`] and run their work
//! under `tracing::dispatcher::with_default`.
//!
//! `tracing` has no critical level; critical records are `error!` events
//! with `severity = "critical"`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use davmirror_core::ConfigError;
use tracing::{error, Dispatch};
use tracing_subscriber::EnvFilter;

/// Filter used when RUST_LOG is not set
pub const DEFAULT_FILTER: &str = "davmirror_core=debug,davmirror_cli=debug";

/// Where configuration failures go, since `log_path` is unknown then
pub const CONFIG_FAILURE_LOG: &str = "config_load.log";

/// Build a dispatcher that appends to `log_path`
pub fn file_dispatch(log_path: &Path) -> Result<Dispatch> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {:?}", log_path))?;

    Ok(dispatch_to(log_file))
}

fn dispatch_to<W: Write + Send + 'static>(writer: W) -> Dispatch {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(writer))
        .finish();

    Dispatch::new(subscriber)
}

/// Record a configuration failure before the real log file is known
pub fn report_config_failure(err: &ConfigError) {
    eprintln!("Critical: {}", err);

    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(CONFIG_FAILURE_LOG)
    else {
        return;
    };

    tracing::dispatcher::with_default(&dispatch_to(file), || {
        error!(severity = "critical", error = %err, "Configuration could not be loaded");
    });
}

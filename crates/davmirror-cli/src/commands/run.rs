//! Run command handler

use std::path::PathBuf;

use anyhow::Result;
use tracing::error;

use davmirror_core::{Config, SyncEngine, SyncError, WebDavClient};

use super::load_config;
use crate::logging;
use crate::output::Output;

/// Mirror the local folder, forever or for a single cycle
pub fn run(config_path: Option<&PathBuf>, once: bool, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;
    let dispatch = logging::file_dispatch(&config.log_path)?;

    output.message(&format!(
        "Mirroring {} to '{}' (log: {})",
        config.local_path.display(),
        config.cloud_path,
        config.log_path.display()
    ));

    tracing::dispatcher::with_default(&dispatch, || mirror(&config, once, output))
}

fn mirror(config: &Config, once: bool, output: &Output) -> Result<()> {
    let client = WebDavClient::new(config.remote_config())
        .map_err(|e| critical(e.into(), "Failed to create WebDAV client"))?;

    let mut engine = SyncEngine::new(client, &config.local_path, config.sync_period)
        .map_err(|e| critical(e, "Cannot start synchronization"))?;

    if once {
        let report = engine
            .run_cycle()
            .map_err(|e| critical(e, "Synchronization stopped"))?;
        output.print_report(&report);
        return Ok(());
    }

    engine
        .run(None)
        .map_err(|e| critical(e, "Synchronization stopped"))?;
    Ok(())
}

/// Log a critical record and turn the error into the process exit error
fn critical(err: SyncError, message: &'static str) -> anyhow::Error {
    let hint = err.recovery_suggestion();
    error!(severity = "critical", error = %err, hint, "{}", message);

    let err = anyhow::Error::new(err).context(message);
    match hint {
        Some(hint) => err.context(hint),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use davmirror_core::RemoteError;

    #[test]
    fn test_critical_carries_hint() {
        let err = critical(SyncError::Unauthorized, "Synchronization stopped");
        let chain = format!("{:#}", err);

        assert!(chain.contains("Synchronization stopped"));
        assert!(chain.contains("token"));
        assert!(err.downcast_ref::<SyncError>().is_some());
    }

    #[test]
    fn test_critical_keeps_remote_source() {
        let err = critical(
            RemoteError::InvalidRequest("base URL 'x'".to_string()).into(),
            "Failed to create WebDAV client",
        );
        let chain = format!("{:#}", err);

        assert!(chain.contains("Failed to create WebDAV client"));
        assert!(chain.contains("base URL 'x'"));
        assert!(chain.contains("base_url"));
    }
}

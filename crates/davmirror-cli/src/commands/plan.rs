//! Plan command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use davmirror_core::{SyncEngine, WebDavClient};

use super::load_config;
use crate::logging;
use crate::output::Output;

/// Compute the next cycle's actions without executing them
pub fn plan(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;
    let dispatch = logging::file_dispatch(&config.log_path)?;

    tracing::dispatcher::with_default(&dispatch, || {
        let client =
            WebDavClient::new(config.remote_config()).context("Failed to create WebDAV client")?;
        let engine = SyncEngine::new(client, &config.local_path, config.sync_period)?;

        let plan = engine.plan().context("Failed to compute sync plan")?;
        output.print_plan(&plan);
        Ok(())
    })
}

//! Command handlers

pub mod config;
pub mod plan;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};

use davmirror_core::Config;

use crate::logging;

/// Load configuration, recording a critical failure if it cannot be loaded
pub(crate) fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    Config::load_with_cli_override(config_path)
        .inspect_err(logging::report_config_failure)
        .context("Failed to load configuration")
}

//! Config command handlers

use std::path::PathBuf;

use anyhow::Result;

use davmirror_core::Config;

use super::load_config;
use crate::output::{Output, OutputFormat};

/// Show current configuration with the token masked
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config = load_config(config_path)?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "local_path": config.local_path,
                    "sync_period_secs": config.sync_period.as_secs_f64(),
                    "log_path": config.log_path,
                    "token": config.masked_token(),
                    "cloud_path": config.cloud_path,
                    "base_url": config.base_url
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.local_path.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  local_path:  {}", config.local_path.display());
            println!(
                "  sync_period: {}",
                format_period(config.sync_period.as_secs_f64())
            );
            println!("  log_path:    {}", config.log_path.display());
            println!("  token:       {}", config.masked_token());
            println!(
                "  cloud_path:  {}",
                if config.cloud_path.is_empty() {
                    "(root)"
                } else {
                    &config.cloud_path
                }
            );
            println!("  base_url:    {}", config.base_url);
            println!();
            println!("Config file: {}", effective_path(config_path).display());
        }
    }

    Ok(())
}

/// Print the configuration file that would be read
pub fn path(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let path = effective_path(config_path);
    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "path": path })),
        _ => println!("{}", path.display()),
    }
    Ok(())
}

fn effective_path(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path)
}

fn format_period(secs: f64) -> String {
    if secs >= 60.0 && secs % 60.0 == 0.0 {
        format!("{} min", secs / 60.0)
    } else {
        format!("{} s", secs)
    }
}

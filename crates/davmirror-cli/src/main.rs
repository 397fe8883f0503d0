//! davmirror CLI
//!
//! Mirrors a local folder onto WebDAV storage on a fixed period.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "davmirror")]
#[command(about = "davmirror - one-way mirror of a local folder onto WebDAV storage")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the folder until stopped (default)
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Show what the next cycle would do without changing anything
    Plan,
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the configuration file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    match cli.command.unwrap_or(Commands::Run { once: false }) {
        Commands::Run { once } => commands::run::run(config_path, once, &output),
        Commands::Plan => commands::plan::plan(config_path, &output),
        Commands::Config { command } => match command.unwrap_or(ConfigCommands::Show) {
            ConfigCommands::Show => commands::config::show(config_path, &output),
            ConfigCommands::Path => commands::config::path(config_path, &output),
        },
    }
}

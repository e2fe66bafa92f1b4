//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Load configuration with graceful fallback to defaults.
///
/// If the config file doesn't exist or can't be parsed, commands run on
/// defaults rather than refusing to start.
pub fn load_config() -> wristlink_core::config::Config {
    wristlink_core::config::Config::load().unwrap_or_default()
}

pub mod config;
pub mod demo;

/// Wristlink - phone/wrist companion connectivity demo
#[derive(Parser)]
#[command(name = "wristlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Run the scripted phone/watch exchange
    Demo(DemoArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the demo command
#[derive(clap::Args)]
pub struct DemoArgs {
    /// Root directory for endpoint storage (defaults to the platform data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Simulated latency per transfer progress step, in milliseconds
    #[arg(long)]
    pub step_ms: Option<u64>,

    /// Keep the staged and received files around afterwards
    #[arg(long)]
    pub keep_files: bool,
}

/// Arguments for the config command
#[derive(clap::Args)]
pub struct ConfigArgs {
    /// What to do with the configuration
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

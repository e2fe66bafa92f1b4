//! Wristlink CLI - phone/wrist companion connectivity demo
//!
//! Runs a paired phone/watch session in-process and shows how each
//! command's status flows back into the two user interfaces.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the scripted exchange between the two endpoints
//! wristlink demo
//!
//! # Inspect the configuration
//! wristlink config show
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::Parser;

mod commands;
mod ui;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Demo(args) => commands::demo::run(args).await,
        Command::Config(args) => commands::config::run(&args),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,wristlink=info,wristlink_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

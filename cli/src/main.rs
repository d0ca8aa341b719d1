// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! vkabat CLI
//!
//! Submits one protein sequence to every enabled secondary-structure
//! provider, aggregates the predictions per residue and writes the
//! variability report.
//!
//! # Usage
//!
//! ```bash
//! # Run all providers and write ./lyso_vkabat*.csv
//! vkabat run MKVLAAGIVGLLLA --name lyso
//!
//! # Inspect or generate configuration
//! vkabat config show
//! vkabat config generate --output ./vkabat.yaml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vkabat_orchestrator::commands::{self, ConfigCommand, RunArgs};

/// vkabat - secondary-structure variability across prediction servers
#[derive(Parser)]
#[command(name = "vkabat")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "VKABAT_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "VKABAT_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict a sequence with every enabled provider and write the report
    Run(RunArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;
    info!("vkabat {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(Commands::Run(args)) => commands::run::handle_command(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            println!(
                "{}",
                "No command specified. Use --help for usage information.".yellow()
            );
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

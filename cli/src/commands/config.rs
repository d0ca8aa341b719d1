// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use vkabat_core::domain::config::{JpredApi, VkabatConfig};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./vkabat.yaml)
        #[arg(short, long, default_value = "./vkabat.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, force } => generate(&output, force).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = VkabatConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. VKABAT_CONFIG_PATH: {}",
            std::env::var("VKABAT_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./vkabat.yaml");
        println!("  4. ~/.vkabat/config.yaml");
        println!();
    }

    if as_yaml {
        print!("{}", config.to_yaml_string()?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Job:".bold());
    println!("  Name: {}", config.job_name);
    println!("  Output directory: {}", config.output_dir.display());
    if !config.email.is_empty() {
        println!("  Email: {}", config.email);
    }
    println!();

    let providers = &config.providers;
    println!("{}", "Providers:".bold());

    let prabi = &providers.prabi;
    println!("  {} {}", "PRABI".bold(), enabled_label(prabi.enabled));
    println!("    Endpoint: {}", prabi.base_url);
    println!("    Algorithms: {}", prabi.algorithms.join(", "));

    let jpred = &providers.jpred;
    println!("  {} {}", "JPred".bold(), enabled_label(jpred.enabled));
    match jpred.api {
        JpredApi::Form => println!("    Form: {}", jpred.form_url),
        JpredApi::Rest => println!("    REST: {}", jpred.rest_url),
    }
    println!("    Timeout: {}s, poll every {}s", jpred.timeout_secs, jpred.polling().interval.as_secs());

    let yaspin = &providers.yaspin;
    println!("  {} {}", "YASPIN".bold(), enabled_label(yaspin.enabled));
    println!("    Endpoint: {}", yaspin.submit_url);
    println!("    Timeout: {}s, poll every {}s", yaspin.timeout_secs, yaspin.poll_interval_secs);

    let sympred = &providers.sympred;
    println!("  {} {}", "SymPred".bold(), enabled_label(sympred.enabled));
    println!("    Endpoint: {}", sympred.submit_url);
    println!("    Timeout: {}s, poll every {}s", sympred.timeout_secs, sympred.poll_interval_secs);
    println!();

    Ok(())
}

fn enabled_label(enabled: bool) -> colored::ColoredString {
    if enabled {
        "enabled".green()
    } else {
        "disabled".dimmed()
    }
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = VkabatConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let sample = VkabatConfig::default().to_yaml_string()?;
    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

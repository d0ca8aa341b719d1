// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Prediction run command
//!
//! Loads configuration, applies command-line overrides, runs every enabled
//! provider and writes the report files.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use vkabat_core::application::{AnalysisOutcome, Orchestrator, VkabatService};
use vkabat_core::domain::config::VkabatConfig;
use vkabat_core::domain::polling::TokioClock;
use vkabat_core::domain::provider::PredictionRequest;
use vkabat_core::domain::sequence::Sequence;
use vkabat_core::domain::vkabat::VkabatError;
use vkabat_core::infrastructure::{ProviderRegistry, ReportWriter, ReqwestFetcher};

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Amino-acid sequence in one-letter codes
    #[arg(value_name = "SEQUENCE")]
    pub sequence: String,

    /// Job / sequence name, used as the output file prefix
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Contact email forwarded to the providers
    #[arg(short, long)]
    pub email: Option<String>,

    /// JPred timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub jpred_timeout: Option<u64>,

    /// YASPIN timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub yaspin_timeout: Option<u64>,

    /// SymPred timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub sympred_timeout: Option<u64>,

    /// Also write the full report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Flags win over the configuration file and environment.
    pub fn apply_overrides(&self, config: &mut VkabatConfig) {
        if let Some(name) = &self.name {
            config.job_name = name.clone();
        }
        if let Some(dir) = &self.dir {
            config.output_dir = dir.clone();
        }
        if let Some(email) = &self.email {
            config.email = email.clone();
        }
        if let Some(secs) = self.jpred_timeout {
            config.providers.jpred.timeout_secs = secs;
        }
        if let Some(secs) = self.yaspin_timeout {
            config.providers.yaspin.timeout_secs = secs;
        }
        if let Some(secs) = self.sympred_timeout {
            config.providers.sympred.timeout_secs = secs;
        }
    }
}

pub async fn handle_command(args: RunArgs, config_override: Option<PathBuf>) -> Result<()> {
    let mut config =
        VkabatConfig::load_or_default(config_override).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    config
        .validate()
        .context("Configuration validation failed")?;

    let sequence = Sequence::parse(&args.sequence).context("Invalid input sequence")?;
    let request =
        PredictionRequest::new(sequence, config.job_name.clone()).with_email(config.email.clone());

    let registry = ProviderRegistry::from_config(
        &config,
        Arc::new(ReqwestFetcher::new()?),
        Arc::new(TokioClock),
    )?;
    if registry.is_empty() {
        anyhow::bail!("No providers enabled; nothing to run");
    }

    println!(
        "Running {} on {} residues ({})",
        config.job_name.bold(),
        request.sequence.len(),
        registry.names().join(", ")
    );

    let service = VkabatService::new(Orchestrator::new(registry.providers().to_vec()));
    let outcome = match service.run(&request).await {
        Ok(outcome) => outcome,
        Err(VkabatError::NoData) => {
            println!("{}", "✗ Every provider failed; no report written".red());
            return Err(VkabatError::NoData.into());
        }
        Err(e) => return Err(e).context("Vkabat run failed"),
    };

    let written = ReportWriter::new(&config.output_dir).write(&outcome.report, args.json)?;

    print_summary(&outcome);
    println!();
    println!("  {}", written.dataframe.display());
    println!("  {}", written.series.display());
    if let Some(json) = &written.json {
        println!("  {}", json.display());
    }

    Ok(())
}

fn print_summary(outcome: &AnalysisOutcome) {
    let report = &outcome.report;
    println!(
        "{}",
        format!(
            "✓ {} predictions aggregated over {} residues",
            report.columns.len(),
            report.residue_count()
        )
        .green()
    );
    println!("  Run ID: {}", report.run_id);
    println!("  Columns: {}", report.columns.join(", "));

    if !outcome.failures.is_empty() {
        println!("{}", "Excluded:".yellow().bold());
        for failure in &outcome.failures {
            println!("  {} {}", failure.provider.bold(), failure.error.to_string().dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = RunArgs {
            sequence: "MKVL".to_string(),
            name: Some("lyso".to_string()),
            dir: Some(PathBuf::from("/tmp/out")),
            jpred_timeout: Some(60),
            sympred_timeout: Some(30),
            ..Default::default()
        };

        let mut config = VkabatConfig::default();
        config.email = "from-file@example.org".to_string();
        args.apply_overrides(&mut config);

        assert_eq!(config.job_name, "lyso");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.email, "from-file@example.org");
        assert_eq!(config.providers.jpred.timeout_secs, 60);
        assert_eq!(config.providers.yaspin.timeout_secs, 1300);
        assert_eq!(config.providers.sympred.timeout_secs, 30);
    }

    #[test]
    fn test_zero_timeout_flag_fails_validation() {
        let args = RunArgs {
            yaspin_timeout: Some(0),
            ..Default::default()
        };
        let mut config = VkabatConfig::default();
        args.apply_overrides(&mut config);
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_sequence_rejected_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vkabat.yaml");
        std::fs::write(&path, "job_name: bad\n").unwrap();

        let args = RunArgs {
            sequence: "MK1L".to_string(),
            dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let err = handle_command(args, Some(path)).await.unwrap_err();
        assert!(err.to_string().contains("Invalid input sequence"));
        assert!(!dir.path().join("bad_vkabat.csv").exists());
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Vkabat Analysis Service
//
// One run end to end: collect provider results through the orchestrator,
// aggregate them into per-residue records, and package the report.

use chrono::Utc;
use tracing::{info, info_span, Instrument};

use crate::application::orchestrator::Orchestrator;
use crate::domain::label::CanonicalLabel;
use crate::domain::prediction::ProviderFailure;
use crate::domain::provider::PredictionRequest;
use crate::domain::vkabat::{aggregate, RunId, VkabatError, VkabatReport};

/// Report plus the providers that were left out of it.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub report: VkabatReport,
    pub failures: Vec<ProviderFailure>,
}

pub struct VkabatService {
    orchestrator: Orchestrator,
}

impl VkabatService {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn run(&self, request: &PredictionRequest) -> Result<AnalysisOutcome, VkabatError> {
        let run_id = RunId::new();
        let span = info_span!("vkabat_run", run_id = %run_id, job = %request.job_name);
        self.execute(run_id, request).instrument(span).await
    }

    async fn execute(&self, run_id: RunId, request: &PredictionRequest) -> Result<AnalysisOutcome, VkabatError> {
        info!(
            residues = request.sequence.len(),
            providers = self.orchestrator.provider_count(),
            "Starting vkabat run"
        );
        metrics::counter!("vkabat_runs_total").increment(1);

        let collected = self.orchestrator.collect(request).await?;
        let records = aggregate(&collected.results)?;

        let (columns, predictions): (Vec<String>, Vec<Vec<CanonicalLabel>>) = collected
            .results
            .iter()
            .map(|(name, labels)| (name.to_string(), labels.to_vec()))
            .unzip();

        let report = VkabatReport {
            run_id,
            generated_at: Utc::now(),
            job_name: request.job_name.clone(),
            sequence: request.sequence.to_string(),
            columns,
            predictions,
            records,
        };

        info!(
            columns = report.columns.len(),
            excluded = collected.failures.len(),
            "Vkabat run complete"
        );
        Ok(AnalysisOutcome {
            report,
            failures: collected.failures,
        })
    }
}

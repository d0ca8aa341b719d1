// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fan-out / fan-in over the registered prediction providers.
//!
//! Every provider runs on its own tokio task. The orchestrator waits for all
//! of them, files each successful result into a `ResultSet`, and keeps the
//! failures as values. Only two outcomes abort the run: no usable result at
//! all (`NoData`), or two results under one name (`DuplicateProvider`).

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::prediction::{PredictionError, ProviderFailure, ResultSet, ResultSetError};
use crate::domain::provider::{PredictionProvider, PredictionRequest};
use crate::domain::vkabat::VkabatError;

/// Everything a run produced before aggregation.
#[derive(Debug)]
pub struct CollectedResults {
    pub results: ResultSet,
    pub failures: Vec<ProviderFailure>,
}

pub struct Orchestrator {
    providers: Vec<Arc<dyn PredictionProvider>>,
}

impl Orchestrator {
    pub fn new(providers: Vec<Arc<dyn PredictionProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Run every provider concurrently and wait for all of them.
    pub async fn collect(&self, request: &PredictionRequest) -> Result<CollectedResults, VkabatError> {
        let request = Arc::new(request.clone());

        let mut handles = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let task_request = Arc::clone(&request);
            let name = provider.name().to_string();
            debug!(provider = %name, "Dispatching provider");
            handles.push((
                name,
                tokio::spawn(async move { provider.predict(&task_request).await }),
            ));
        }

        let mut results = ResultSet::new(request.sequence.len());
        let mut failures = Vec::new();
        let mut duplicate = None;

        for (family, handle) in handles {
            let predictions = match handle.await {
                Ok(predictions) => predictions,
                Err(e) => {
                    error!(provider = %family, "Provider task failed: {}", e);
                    record_outcome(&family, "task_failed");
                    failures.push(ProviderFailure::new(
                        family,
                        PredictionError::ProviderUnavailable(format!("provider task aborted: {}", e)),
                    ));
                    continue;
                }
            };

            for prediction in predictions {
                match prediction {
                    Ok(result) => {
                        let name = result.provider.clone();
                        match results.insert(result) {
                            Ok(()) => {
                                record_outcome(&name, "success");
                                debug!(provider = %name, "Result accepted");
                            }
                            Err(ResultSetError::Rejected { provider, source }) => {
                                warn!(provider = %provider, error = %source, "Result rejected");
                                record_outcome(&provider, source.kind());
                                failures.push(ProviderFailure::new(provider, source));
                            }
                            Err(ResultSetError::Duplicate(provider)) => {
                                error!(provider = %provider, "Two results share one provider name");
                                duplicate.get_or_insert(provider);
                            }
                        }
                    }
                    Err(failure) => {
                        record_outcome(&failure.provider, failure.error.kind());
                        failures.push(failure);
                    }
                }
            }
        }

        if let Some(provider) = duplicate {
            return Err(VkabatError::DuplicateProvider(provider));
        }

        if results.is_empty() {
            error!(failures = failures.len(), "Every provider failed; no data to aggregate");
            return Err(VkabatError::NoData);
        }

        info!(
            results = results.len(),
            failures = failures.len(),
            "Collected provider results"
        );
        Ok(CollectedResults { results, failures })
    }
}

fn record_outcome(provider: &str, outcome: &'static str) {
    metrics::counter!(
        "vkabat_provider_results_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Prediction Provider Domain Interface (Anti-Corruption Layer)
//
// Every external secondary-structure service is wrapped behind this trait.
// Adapters live in infrastructure/providers/ and translate each service's
// forms, job ids and result pages into normalized `ProviderResult`s.

use async_trait::async_trait;

use crate::domain::prediction::Prediction;
use crate::domain::sequence::Sequence;

/// What the orchestrator hands to every provider for one run.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub sequence: Sequence,
    pub job_name: String,
    pub email: String,
}

impl PredictionRequest {
    pub fn new(sequence: Sequence, job_name: impl Into<String>) -> Self {
        Self {
            sequence,
            job_name: job_name.into(),
            email: String::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Domain interface for prediction providers
#[async_trait]
pub trait PredictionProvider: Send + Sync {
    /// Provider family name used in logs (e.g. "PRABI", "SymPred")
    fn name(&self) -> &str;

    /// Run the prediction. Single-algorithm providers return one entry;
    /// multi-algorithm providers return one entry per algorithm, each
    /// succeeding or failing on its own.
    async fn predict(&self, request: &PredictionRequest) -> Vec<Prediction>;
}

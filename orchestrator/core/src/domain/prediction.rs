// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Prediction results and the per-provider error taxonomy.
//!
//! A `ProviderResult` belongs to the adapter that produced it until it is
//! handed to the orchestrator, which files it into a `ResultSet`. Failures
//! travel as values (`ProviderFailure`) so one provider never aborts another.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use crate::domain::label::CanonicalLabel;

/// Errors a single provider (or one of its sub-algorithms) can produce.
/// All of them are recovered by excluding that provider from the run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictionError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unrecognized label symbol '{symbol}' at residue {position}")]
    Normalization { symbol: char, position: usize },

    #[error("Timed out after {}s", .elapsed.as_secs())]
    TimedOut { elapsed: Duration },

    #[error("Expected {expected} labels, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

impl PredictionError {
    /// Short stable name used for metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::ProviderUnavailable(_) => "provider_unavailable",
            PredictionError::Parse(_) => "parse_error",
            PredictionError::Normalization { .. } => "normalization_error",
            PredictionError::TimedOut { .. } => "timed_out",
            PredictionError::LengthMismatch { .. } => "length_mismatch",
        }
    }
}

/// Normalized per-residue labels for one provider or sub-algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub provider: String,
    pub labels: Vec<CanonicalLabel>,
}

impl ProviderResult {
    pub fn new(provider: impl Into<String>, labels: Vec<CanonicalLabel>) -> Self {
        Self {
            provider: provider.into(),
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A failed provider or sub-algorithm, kept for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: PredictionError,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, error: PredictionError) -> Self {
        Self {
            provider: provider.into(),
            error,
        }
    }
}

/// Outcome of one provider or sub-algorithm.
pub type Prediction = Result<ProviderResult, ProviderFailure>;

#[derive(Debug, Error, PartialEq)]
pub enum ResultSetError {
    #[error("Result '{provider}' rejected: {source}")]
    Rejected {
        provider: String,
        #[source]
        source: PredictionError,
    },

    #[error("Duplicate result for provider '{0}'")]
    Duplicate(String),
}

/// Successful results of one run, keyed by provider name.
///
/// Every stored result has exactly `residue_count` labels; anything else is
/// refused at insertion time.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    residue_count: usize,
    results: BTreeMap<String, Vec<CanonicalLabel>>,
}

impl ResultSet {
    pub fn new(residue_count: usize) -> Self {
        Self {
            residue_count,
            results: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, result: ProviderResult) -> Result<(), ResultSetError> {
        if self.results.contains_key(&result.provider) {
            return Err(ResultSetError::Duplicate(result.provider));
        }
        if result.len() != self.residue_count {
            return Err(ResultSetError::Rejected {
                provider: result.provider,
                source: PredictionError::LengthMismatch {
                    expected: self.residue_count,
                    actual: result.labels.len(),
                },
            });
        }
        self.results.insert(result.provider, result.labels);
        Ok(())
    }

    pub fn residue_count(&self) -> usize {
        self.residue_count
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn get(&self, provider: &str) -> Option<&[CanonicalLabel]> {
        self.results.get(provider).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CanonicalLabel])> {
        self.results
            .iter()
            .map(|(name, labels)| (name.as_str(), labels.as_slice()))
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// PRABI Provider Adapter
//
// Synchronous, multi-algorithm. Every algorithm is one url-encoded POST to
// its own CGI script; the response page carries the prediction as a run of
// coloured <font> elements inside the first <code> block. All algorithms are
// requested concurrently and succeed or fail independently.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::config::PrabiConfig;
use crate::domain::label::CanonicalLabel;
use crate::domain::normalizer::LabelMap;
use crate::domain::prediction::{Prediction, PredictionError, ProviderFailure, ProviderResult};
use crate::domain::provider::{PredictionProvider, PredictionRequest};
use crate::infrastructure::extract::Markup;
use crate::infrastructure::http::{Fetcher, Payload};

use super::expect_status;

pub struct PrabiAdapter {
    config: PrabiConfig,
    fetcher: Arc<dyn Fetcher>,
    labels: LabelMap,
}

impl PrabiAdapter {
    pub fn new(config: PrabiConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            fetcher,
            labels: LabelMap::prabi(),
        }
    }

    /// CGI script suffix for an algorithm (`secpred_{suffix}.pl`).
    fn script(algorithm: &str) -> Option<&'static str> {
        match algorithm {
            "gor1" => Some("gor"),
            "gor3" => Some("gib"),
            "dpm" => Some("dpm"),
            "predator" => Some("preda"),
            "hnn" => Some("hnn"),
            "sopm" => Some("sopm"),
            "mlrc" => Some("mlr"),
            "dsc" => Some("dsc"),
            _ => None,
        }
    }

    fn endpoint(&self, algorithm: &str) -> Option<String> {
        Self::script(algorithm).map(|script| {
            format!(
                "{}/secpred_{}.pl",
                self.config.base_url.trim_end_matches('/'),
                script
            )
        })
    }

    fn form(&self, algorithm: &str, request: &PredictionRequest) -> Vec<(String, String)> {
        let mut fields = vec![
            ("title".to_string(), request.job_name.clone()),
            ("notice".to_string(), request.sequence.to_string()),
            ("ali_width".to_string(), self.config.alignment_width.to_string()),
        ];

        match algorithm {
            "gor1" => {
                let gor = &self.config.gor1;
                fields.extend([
                    ("constants".to_string(), gor.constants.to_string()),
                    ("dch".to_string(), gor.dch.to_string()),
                    ("dce".to_string(), gor.dce.to_string()),
                    ("dct".to_string(), gor.dct.to_string()),
                    ("dcc".to_string(), gor.dcc.to_string()),
                ]);
            }
            "predator" => {
                fields.push((
                    "predatorssmat".to_string(),
                    self.config.predator_matrix.as_str().to_string(),
                ));
            }
            "sopm" => {
                let sopm = &self.config.sopm;
                fields.extend([
                    ("states".to_string(), sopm.states.to_string()),
                    ("threshold".to_string(), sopm.threshold.to_string()),
                    ("width".to_string(), sopm.width.to_string()),
                ]);
            }
            _ => {}
        }

        fields
    }

    async fn run_algorithm(&self, algorithm: &str, request: &PredictionRequest) -> Prediction {
        self.try_algorithm(algorithm, request)
            .await
            .map(|labels| ProviderResult::new(algorithm, labels))
            .map_err(|e| {
                warn!(provider = "PRABI", algorithm, error = %e, "Algorithm failed");
                ProviderFailure::new(algorithm, e)
            })
    }

    async fn try_algorithm(
        &self,
        algorithm: &str,
        request: &PredictionRequest,
    ) -> Result<Vec<CanonicalLabel>, PredictionError> {
        let url = self.endpoint(algorithm).ok_or_else(|| {
            PredictionError::ProviderUnavailable(format!("no PRABI endpoint for algorithm '{}'", algorithm))
        })?;

        debug!(algorithm, url = %url, "Submitting PRABI request");
        let doc = self
            .fetcher
            .post(&url, Payload::UrlEncoded(self.form(algorithm, request)))
            .await?;
        expect_status(&doc, &[200], "PRABI")?;

        let raw = extract_symbols(&doc.body)?;
        self.labels.normalize(&raw)
    }
}

/// Upper-cased text of every <font> element inside the first <code> block.
fn extract_symbols(body: &str) -> Result<String, PredictionError> {
    let code = Markup::new(body).first("code")?;
    let fonts = code.all_texts("font")?;
    if fonts.is_empty() {
        return Err(PredictionError::Parse("no <font> elements in <code> block".to_string()));
    }
    Ok(fonts.concat().to_uppercase())
}

#[async_trait]
impl PredictionProvider for PrabiAdapter {
    fn name(&self) -> &str {
        "PRABI"
    }

    async fn predict(&self, request: &PredictionRequest) -> Vec<Prediction> {
        info!(algorithms = self.config.algorithms.len(), "Running PRABI");

        let runs = self
            .config
            .algorithms
            .iter()
            .map(|algorithm| self.run_algorithm(algorithm, request));
        join_all(runs).await
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// SymPred Provider Adapter
//
// Asynchronous, multi-algorithm from a single job. One submission runs five
// sub-predictors; the finished `result.hpred` file is a fixed-width text
// block where every line starts with a tag (AA, PHD, PROF, ...) padded to a
// shared column. Each sub-predictor becomes its own result.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::config::SympredConfig;
use crate::domain::normalizer::{column_offset, slice_columns, LabelMap};
use crate::domain::polling::Clock;
use crate::domain::prediction::{Prediction, PredictionError, ProviderFailure, ProviderResult};
use crate::domain::provider::{PredictionProvider, PredictionRequest};
use crate::infrastructure::http::{FormField, Fetcher, Payload};

use super::{expect_status, fail_all, job_id_from_redirect, probe_result_page};

/// Sub-predictors reported by SymPred, in output order.
pub const SUB_PREDICTORS: [&str; 5] = ["PHD", "PROF", "SSPRO", "JNET", "PSIPRED"];

const SEQUENCE_TAG: &str = "AA";

pub struct SympredAdapter {
    config: SympredConfig,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    labels: LabelMap,
}

impl SympredAdapter {
    pub fn new(config: SympredConfig, fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            fetcher,
            clock,
            labels: LabelMap::blank_coil(),
        }
    }

    fn form(&self, request: &PredictionRequest) -> Vec<FormField> {
        vec![
            FormField::text("seq", format!(">query\n{}", request.sequence)),
            FormField::empty_file("seq_file"),
            FormField::text("email", request.email.as_str()),
            FormField::text("sympred", "Do prediction"),
            FormField::text("conmethod", "D"),
            FormField::text("conweight", "N"),
            FormField::text("window", self.config.window.to_string()),
            FormField::text("database", self.config.database.as_str()),
            FormField::text("pred1", "-phdpsi"),
            FormField::text("pred2", "-prof"),
            FormField::text("pred3", "-sspro"),
            FormField::text("pred6", "-jnet"),
            FormField::text("pred7", "-psipred"),
            FormField::text("MB", ""),
            FormField::text("mbjob[description]", request.job_name.as_str()),
        ]
    }

    async fn fetch_result(&self, request: &PredictionRequest) -> Result<String, PredictionError> {
        let started = self.clock.now();

        let doc = self
            .fetcher
            .post(&self.config.submit_url, Payload::Multipart(self.form(request)))
            .await?;
        expect_status(&doc, &[202], "SymPred")?;

        let job_id = job_id_from_redirect(&doc.url)?;
        info!(provider = "SymPred", job_id = %job_id, "Job submitted");

        let url = format!(
            "{}/{}/result.hpred",
            self.config.jobs_base.trim_end_matches('/'),
            job_id
        );
        let fetcher = self.fetcher.as_ref();
        let url = url.as_str();
        let body = self
            .config
            .polling()
            .run(self.clock.as_ref(), started, &job_id, move || {
                probe_result_page(fetcher, url, &[202, 404])
            })
            .await
            .into_body()?;

        let elapsed = self.clock.now().saturating_duration_since(started);
        info!(provider = "SymPred", job_id = %job_id, elapsed_secs = elapsed.as_secs(), "Job complete");
        Ok(body)
    }

    fn parse(&self, body: &str) -> Vec<Prediction> {
        let blocks = match TaggedBlocks::parse(body) {
            Ok(blocks) => blocks,
            Err(e) => return fail_all(&SUB_PREDICTORS, e),
        };

        SUB_PREDICTORS
            .iter()
            .map(|name| {
                blocks
                    .columns(name)
                    .and_then(|raw| self.labels.normalize(&raw))
                    .map(|labels| ProviderResult::new(*name, labels))
                    .map_err(|e| {
                        warn!(provider = "SymPred", predictor = *name, error = %e, "Sub-predictor failed");
                        ProviderFailure::new(*name, e)
                    })
            })
            .collect()
    }
}

/// Lines of a `result.hpred` file grouped by their leading tag.
struct TaggedBlocks<'a> {
    offset: usize,
    lines: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> TaggedBlocks<'a> {
    fn parse(body: &'a str) -> Result<Self, PredictionError> {
        let mut lines: HashMap<&str, Vec<&str>> = HashMap::new();
        for line in body.lines() {
            if line.contains('#') || line.trim().is_empty() {
                continue;
            }
            if let Some(tag) = line.split_whitespace().next() {
                lines.entry(tag).or_default().push(line);
            }
        }

        let header = lines
            .get(SEQUENCE_TAG)
            .and_then(|aa| aa.first())
            .ok_or_else(|| PredictionError::Parse("no AA line in SymPred output".to_string()))?;
        let offset = column_offset(header, SEQUENCE_TAG)?;

        Ok(Self { offset, lines })
    }

    fn columns(&self, tag: &str) -> Result<String, PredictionError> {
        let lines = self
            .lines
            .get(tag)
            .ok_or_else(|| PredictionError::Parse(format!("no {} lines in SymPred output", tag)))?;
        slice_columns(lines.iter().copied(), self.offset)
    }
}

#[async_trait]
impl PredictionProvider for SympredAdapter {
    fn name(&self) -> &str {
        "SymPred"
    }

    async fn predict(&self, request: &PredictionRequest) -> Vec<Prediction> {
        info!("Running SymPred");
        match self.fetch_result(request).await {
            Ok(body) => self.parse(&body),
            Err(e) => {
                warn!(provider = "SymPred", error = %e, "Job failed");
                fail_all(&SUB_PREDICTORS, e)
            }
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// YASPIN Provider Adapter
//
// Asynchronous, job-based. The web form answers 202 after redirecting to the
// job page; the job id is the last path segment of that URL. The plain-text
// `results.out` file is 404 until the job finishes.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::config::YaspinConfig;
use crate::domain::label::CanonicalLabel;
use crate::domain::normalizer::LabelMap;
use crate::domain::polling::Clock;
use crate::domain::prediction::{Prediction, PredictionError, ProviderFailure, ProviderResult};
use crate::domain::provider::{PredictionProvider, PredictionRequest};
use crate::infrastructure::http::{FormField, Fetcher, Payload};

use super::{expect_status, job_id_from_redirect, probe_result_page};

pub const RESULT_NAME: &str = "YASPIN";

pub struct YaspinAdapter {
    config: YaspinConfig,
    fetcher: Arc<dyn Fetcher>,
    clock: Arc<dyn Clock>,
    labels: LabelMap,
}

impl YaspinAdapter {
    pub fn new(config: YaspinConfig, fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            fetcher,
            clock,
            labels: LabelMap::gapped(),
        }
    }

    fn form(request: &PredictionRequest) -> Vec<FormField> {
        vec![
            FormField::text("seq", request.sequence.as_str()),
            FormField::empty_file("seq_file"),
            FormField::empty_file("pssm_file"),
            FormField::text("smethod", "nr"),
            FormField::text("nnmethod", "dssp"),
            FormField::text("email", request.email.as_str()),
            FormField::text("mbjob[description]", request.job_name.as_str()),
            FormField::text("yaspin_align", "YASPIN prediction"),
        ]
    }

    async fn run(&self, request: &PredictionRequest) -> Result<Vec<CanonicalLabel>, PredictionError> {
        let started = self.clock.now();

        let doc = self
            .fetcher
            .post(&self.config.submit_url, Payload::Multipart(Self::form(request)))
            .await?;
        expect_status(&doc, &[202], RESULT_NAME)?;

        let job_id = job_id_from_redirect(&doc.url)?;
        info!(provider = RESULT_NAME, job_id = %job_id, "Job submitted");

        let url = format!(
            "{}/{}/results.out",
            self.config.jobs_base.trim_end_matches('/'),
            job_id
        );
        let fetcher = self.fetcher.as_ref();
        let url = url.as_str();
        let body = self
            .config
            .polling()
            .run(self.clock.as_ref(), started, &job_id, move || {
                probe_result_page(fetcher, url, &[404])
            })
            .await
            .into_body()?;

        let elapsed = self.clock.now().saturating_duration_since(started);
        info!(provider = RESULT_NAME, job_id = %job_id, elapsed_secs = elapsed.as_secs(), "Job complete");

        self.labels.normalize(&extract_prediction(&body)?)
    }
}

/// Text after `Pred: ` on every prediction line; lines containing `*`
/// (confidence markers) are skipped.
fn extract_prediction(body: &str) -> Result<String, PredictionError> {
    let prediction: String = body
        .lines()
        .filter(|line| !line.contains('*'))
        .filter_map(|line| line.split_once("Pred: ").map(|(_, rest)| rest))
        .collect();

    if prediction.is_empty() {
        return Err(PredictionError::Parse("no 'Pred:' lines in YASPIN output".to_string()));
    }
    Ok(prediction)
}

#[async_trait]
impl PredictionProvider for YaspinAdapter {
    fn name(&self) -> &str {
        RESULT_NAME
    }

    async fn predict(&self, request: &PredictionRequest) -> Vec<Prediction> {
        info!("Running YASPIN");
        let outcome = self
            .run(request)
            .await
            .map(|labels| ProviderResult::new(RESULT_NAME, labels))
            .map_err(|e| {
                warn!(provider = RESULT_NAME, error = %e, "Prediction failed");
                ProviderFailure::new(RESULT_NAME, e)
            });
        vec![outcome]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::label::labels_to_string;
    use crate::domain::polling::ManualClock;
    use crate::domain::sequence::Sequence;
    use crate::infrastructure::providers::testing::{doc, ScriptedFetcher};
    use std::time::Duration;

    const SUBMIT: &str = "https://yaspin.test/programs/yaspinwww/";
    const JOB_PAGE: &str = "https://yaspin.test/jobs/y123/";
    const RESULT: &str = "http://jobs.test/jobs/y123/results.out";

    const OUTPUT: &str = "\
# YASPIN output
 AA: MKVLAG
Pred: -HHH-E
Conf: 987789
 *** end ***  Pred: XXXXXX
";

    fn config(timeout_secs: u64) -> YaspinConfig {
        YaspinConfig {
            timeout_secs,
            submit_url: SUBMIT.to_string(),
            jobs_base: "http://jobs.test/jobs/".to_string(),
            ..YaspinConfig::default()
        }
    }

    fn request() -> PredictionRequest {
        PredictionRequest::new(Sequence::parse("MKVLAG").unwrap(), "lyso")
    }

    #[tokio::test]
    async fn test_completes_after_polling() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .on_post(SUBMIT, doc(202, JOB_PAGE, "queued"))
                .on_get(RESULT, doc(404, RESULT, ""))
                .on_get(RESULT, doc(200, RESULT, OUTPUT)),
        );
        let clock = Arc::new(ManualClock::new());
        let adapter = YaspinAdapter::new(config(1300), fetcher.clone(), clock.clone());

        let results = adapter.predict(&request()).await;
        let result = results[0].as_ref().unwrap();
        assert_eq!(result.provider, "YASPIN");
        assert_eq!(labels_to_string(&result.labels), "CHHHCE");
        assert_eq!(clock.elapsed(), Duration::from_secs(5));

        let posted = fetcher.posted.lock();
        match &posted[0].1 {
            Payload::Multipart(fields) => {
                assert!(fields.contains(&FormField::text("yaspin_align", "YASPIN prediction")));
                assert!(fields.contains(&FormField::empty_file("pssm_file")));
                assert!(fields.contains(&FormField::text("mbjob[description]", "lyso")));
            }
            other => panic!("Expected multipart form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submission_must_be_accepted() {
        let fetcher = Arc::new(ScriptedFetcher::new().on_post(SUBMIT, doc(200, SUBMIT, "form again")));
        let adapter = YaspinAdapter::new(config(1300), fetcher.clone(), Arc::new(ManualClock::new()));

        let results = adapter.predict(&request()).await;
        assert!(matches!(
            results[0].as_ref().unwrap_err().error,
            PredictionError::ProviderUnavailable(_)
        ));
        assert!(fetcher.fetched.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_status_stops_polling() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .on_post(SUBMIT, doc(202, JOB_PAGE, "queued"))
                .on_get(RESULT, doc(404, RESULT, ""))
                .on_get(RESULT, doc(500, RESULT, "")),
        );
        let adapter = YaspinAdapter::new(config(1300), fetcher.clone(), Arc::new(ManualClock::new()));

        let results = adapter.predict(&request()).await;
        assert!(matches!(
            results[0].as_ref().unwrap_err().error,
            PredictionError::ProviderUnavailable(_)
        ));
        assert_eq!(fetcher.get_count(RESULT), 2);
    }

    #[test]
    fn test_extract_skips_starred_lines() {
        assert_eq!(extract_prediction(OUTPUT).unwrap(), "-HHH-E");
        assert!(extract_prediction("nothing here").is_err());
    }
}
